use async_trait::async_trait;
use loschat::llm::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatStream, ChatStreamChunk,
    Choice, LlmClient, StreamFinishReason, ToolCallChunk,
};
use loschat::los::{LosClient, LosUser, SignIn};
use loschat::{Error, Result};
use serde_json::{Value, json};
use std::sync::Mutex;

/// Mock LLM client driven by scripted streams and completions.
pub struct MockLlmClient {
    pub stream_scripts: Mutex<Vec<Vec<ChatStreamChunk>>>,
    pub completions: Mutex<Vec<Result<String>>>,
    pub stream_error: Mutex<Option<Error>>,
    pub stream_requests: Mutex<Vec<ChatCompletionRequest>>,
    pub completion_requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            stream_scripts: Mutex::new(Vec::new()),
            completions: Mutex::new(Vec::new()),
            stream_error: Mutex::new(None),
            stream_requests: Mutex::new(Vec::new()),
            completion_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push_stream(&self, chunks: Vec<ChatStreamChunk>) {
        self.stream_scripts.lock().unwrap().push(chunks);
    }

    pub fn push_completion(&self, content: impl Into<String>) {
        self.completions.lock().unwrap().push(Ok(content.into()));
    }

    pub fn push_completion_error(&self, error: Error) {
        self.completions.lock().unwrap().push(Err(error));
    }

    pub fn fail_streams_with(&self, error: Error) {
        *self.stream_error.lock().unwrap() = Some(error);
    }

    pub fn stream_requests(&self) -> Vec<ChatCompletionRequest> {
        self.stream_requests.lock().unwrap().clone()
    }

    pub fn completion_requests(&self) -> Vec<ChatCompletionRequest> {
        self.completion_requests.lock().unwrap().clone()
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn create_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        self.completion_requests.lock().unwrap().push(request);

        let mut completions = self.completions.lock().unwrap();
        if completions.is_empty() {
            return Err(Error::llm("No more mock completions available"));
        }
        let content = completions.remove(0)?;

        Ok(ChatCompletionResponse {
            id: "chatcmpl-mock".to_string(),
            model: "mock".to_string(),
            choices: vec![Choice {
                index: 0,
                message: ChatMessage::assistant(content),
                finish_reason: Some("Stop".to_string()),
            }],
            usage: None,
        })
    }

    async fn create_chat_completion_stream(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatStream> {
        self.stream_requests.lock().unwrap().push(request);

        if let Some(error) = self.stream_error.lock().unwrap().clone() {
            return Err(error);
        }

        let mut scripts = self.stream_scripts.lock().unwrap();
        if scripts.is_empty() {
            return Err(Error::llm("No more mock streams available"));
        }
        let chunks = scripts.remove(0);

        Ok(Box::pin(futures::stream::iter(
            chunks.into_iter().map(Ok),
        )))
    }
}

/// A stream that emits `text` split into word-sized deltas, then stops.
pub fn content_stream(text: &str) -> Vec<ChatStreamChunk> {
    let mut chunks: Vec<ChatStreamChunk> = text
        .split_inclusive(' ')
        .map(|piece| ChatStreamChunk {
            content: Some(piece.to_string()),
            ..Default::default()
        })
        .collect();
    chunks.push(ChatStreamChunk {
        finish_reason: Some(StreamFinishReason::Stop),
        ..Default::default()
    });
    chunks
}

/// A stream that requests one tool call, with the arguments split across
/// two fragments the way providers actually deliver them.
pub fn tool_call_stream(id: &str, name: &str, arguments: &Value) -> Vec<ChatStreamChunk> {
    let serialized = arguments.to_string();
    let midpoint = serialized.len() / 2;
    let (head, tail) = serialized.split_at(midpoint);

    vec![
        ChatStreamChunk {
            tool_calls: vec![ToolCallChunk {
                index: 0,
                id: Some(id.to_string()),
                name: Some(name.to_string()),
                arguments: Some(head.to_string()),
            }],
            ..Default::default()
        },
        ChatStreamChunk {
            tool_calls: vec![ToolCallChunk {
                index: 0,
                id: None,
                name: None,
                arguments: Some(tail.to_string()),
            }],
            ..Default::default()
        },
        ChatStreamChunk {
            finish_reason: Some(StreamFinishReason::ToolCalls),
            ..Default::default()
        },
    ]
}

/// Mock LOS client with fixed responses per operation.
pub struct MockLosClient {
    pub search_response: Mutex<Option<Result<Value>>>,
    pub detail_response: Mutex<Option<Result<Value>>>,
    pub sign_in_response: Mutex<Option<Result<SignIn>>>,
    pub search_calls: Mutex<Vec<String>>,
    pub detail_calls: Mutex<Vec<(String, String)>>,
}

impl MockLosClient {
    pub fn new() -> Self {
        Self {
            search_response: Mutex::new(None),
            detail_response: Mutex::new(None),
            sign_in_response: Mutex::new(None),
            search_calls: Mutex::new(Vec::new()),
            detail_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_search_result(self, value: Value) -> Self {
        *self.search_response.lock().unwrap() = Some(Ok(value));
        self
    }

    pub fn with_search_error(self, error: Error) -> Self {
        *self.search_response.lock().unwrap() = Some(Err(error));
        self
    }

    pub fn with_detail_result(self, value: Value) -> Self {
        *self.detail_response.lock().unwrap() = Some(Ok(value));
        self
    }

    pub fn with_detail_error(self, error: Error) -> Self {
        *self.detail_response.lock().unwrap() = Some(Err(error));
        self
    }

    pub fn with_sign_in(self, user_id: Value, name: &str, email: &str, token: &str) -> Self {
        *self.sign_in_response.lock().unwrap() = Some(Ok(SignIn {
            user: LosUser {
                id: user_id,
                name: name.to_string(),
                email: email.to_string(),
            },
            access_token: token.to_string(),
        }));
        self
    }

    pub fn with_sign_in_error(self, error: Error) -> Self {
        *self.sign_in_response.lock().unwrap() = Some(Err(error));
        self
    }
}

impl Default for MockLosClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LosClient for MockLosClient {
    async fn search_by_nic(&self, nic: &str) -> Result<Value> {
        self.search_calls.lock().unwrap().push(nic.to_string());
        self.search_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(Error::upstream("no mock search response")))
    }

    async fn application_detail(&self, application_id: &str, access_token: &str) -> Result<Value> {
        self.detail_calls
            .lock()
            .unwrap()
            .push((application_id.to_string(), access_token.to_string()));
        self.detail_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(Error::upstream("no mock detail response")))
    }

    async fn sign_in(&self, _username: &str, _hashed_password: &str) -> Result<SignIn> {
        self.sign_in_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(Error::unauthenticated("no mock sign-in response")))
    }
}

/// An applicant-detail payload shaped like the LOS returns it, including a
/// field the loan application schema does not know about.
pub fn sample_applicant_details() -> Value {
    json!({
        "personalData": {
            "individualId": 8812,
            "primaryFirstName": "Nimal",
            "primaryLastName": "Perera",
        },
        "rawScoringFlags": {"bureau": "CRIB", "grade": "B+"},
    })
}

/// A fully conforming loan application object, as the extractor's provider
/// call would produce it.
pub fn sample_loan_application() -> Value {
    json!({
        "personalData": {
            "individualId": 8812,
            "primaryLastName": "Perera",
            "primaryFirstName": "Nimal",
            "usedName": "Nimal",
            "primaryTitle": "Mr",
            "gender": "male",
            "civilState": "married",
            "race": "sinhalese",
            "dob": "1985-04-12",
            "nationality": "Sri Lankan",
            "applicantType": "individual",
            "loanAmount": 500000.0,
            "loanPurpose": "home renovation",
            "interestRate": 12.5,
            "loanFrequency": "monthly",
            "loanTerms": 5,
        },
        "contactData": {
            "primaryContact": "0771234567",
            "primaryEmail": "nimal@example.com",
            "relationship": "spouse",
            "relationName": "Kamala Perera",
            "relationLandNumber": "0112345678",
        },
        "addressData": {
            "permanentAddress": "12 Lake Rd, Colombo",
            "mailingAddressData": "12 Lake Rd, Colombo",
            "currentAddressData": "12 Lake Rd, Colombo",
            "residentialState": "owned",
            "currentResidenceYears": 6,
            "currentResidenceMonths": 3,
        },
        "educationData": {"primaryEducationGrade": "A/L"},
        "incomeData": {"personnelIncome": "150000", "businessIncome": "0"},
        "securityData": {"securityType": "none", "movable": "none"},
        "expenseData": {"numberOfDepends": 2, "expenses": "60000"},
        "inquiryOfObligationsData": {"totalLiabilityAmount": "250000"},
    })
}
