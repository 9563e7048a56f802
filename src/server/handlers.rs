use super::types::*;
use crate::llm::ChatMessage;
use crate::los::LosClient;
use crate::store::{ChatStore, Reservation};
use crate::{Error, agent::Orchestrator, auth};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tracing::info;

/// Case-insensitive phrase the caller must supply to confirm a payment.
const CONFIRMATION_PHRASE: &str = "vercel";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ChatStore>,
    pub orchestrator: Arc<Orchestrator>,
    pub los: Arc<dyn LosClient>,
}

type Rejection = (StatusCode, Json<ErrorResponse>);

fn reject(e: Error) -> Rejection {
    (
        e.status_code(),
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}

/// Starts or continues a conversation and streams the assistant's reply.
/// Requires a valid session before any model involvement.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>>, Rejection> {
    let session = auth::authenticate(&state.store, &headers)
        .await
        .map_err(reject)?;

    info!(chat_id = %request.id, "received chat request");

    let incoming: Vec<ChatMessage> = request
        .messages
        .into_iter()
        .map(|m| ChatMessage {
            role: m.role,
            content: m.content,
            tool_calls: None,
            tool_call_id: None,
            name: None,
        })
        .collect();

    let deltas = state
        .orchestrator
        .stream_turn(request.id, incoming, session);

    let events = deltas.map(|item| match item {
        Ok(delta) => Ok(Event::default().data(delta)),
        Err(e) => Err(axum::Error::new(e)),
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Deletes a conversation owned by the requesting session's user.
pub async fn delete_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ChatParams>,
) -> Result<Json<MessageResponse>, Rejection> {
    let Some(id) = params.id else {
        return Err(reject(Error::not_found("missing chat id")));
    };

    let session = auth::authenticate(&state.store, &headers)
        .await
        .map_err(reject)?;

    let chat = state
        .store
        .get_chat(&id)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(Error::not_found(format!("chat {}", id))))?;

    if chat.user_id != session.user_id {
        return Err(reject(Error::Unauthorized));
    }

    state.store.delete_chat(&id).await.map_err(reject)?;
    info!(chat_id = %id, "chat deleted");

    Ok(Json(MessageResponse {
        message: "Chat deleted".to_string(),
    }))
}

/// Marks a reservation as paid once the confirmation phrase checks out.
pub async fn confirm_reservation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ReservationParams>,
    Json(request): Json<ConfirmPaymentRequest>,
) -> Result<Json<Reservation>, Rejection> {
    let Some(id) = params.id else {
        return Err(reject(Error::not_found("missing reservation id")));
    };

    let session = auth::authenticate(&state.store, &headers)
        .await
        .map_err(reject)?;

    let reservation = state
        .store
        .get_reservation(&id)
        .await
        .map_err(reject)?
        .ok_or_else(|| reject(Error::not_found(format!("reservation {}", id))))?;

    if reservation.user_id != session.user_id {
        return Err(reject(Error::Unauthorized));
    }

    // Idempotency guard comes before the phrase check: a completed payment
    // conflicts regardless of what the caller sends.
    if reservation.has_completed_payment {
        return Err(reject(Error::AlreadyCompleted));
    }

    match request.magic_word {
        Some(ref word) if word.eq_ignore_ascii_case(CONFIRMATION_PHRASE) => {}
        _ => return Err(reject(Error::validation("Invalid magic word!"))),
    }

    state.store.mark_reservation_paid(&id).await.map_err(reject)?;
    info!(reservation_id = %id, "reservation marked as paid");

    Ok(Json(Reservation {
        has_completed_payment: true,
        ..reservation
    }))
}

/// Proxies the identity search so the UI can validate a NIC before handing
/// it to the conversation.
pub async fn search_applications(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ApplicationsParams>,
) -> Result<Json<serde_json::Value>, Rejection> {
    let Some(nic) = params.old_nic else {
        return Err(reject(Error::not_found("missing oldNic parameter")));
    };

    auth::authenticate(&state.store, &headers)
        .await
        .map_err(reject)?;

    // Upstream failures surface as a flat 502; the upstream status code is
    // not mirrored through.
    let applications = state.los.search_by_nic(&nic).await.map_err(reject)?;
    Ok(Json(applications))
}

/// Exchanges credentials for a session token via the LOS identity provider.
pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, Rejection> {
    let signed_in = auth::sign_in(
        &state.store,
        state.los.as_ref(),
        &request.email,
        &request.password,
    )
    .await
    .map_err(reject)?;

    info!(user_id = %signed_in.user.id, "user signed in");

    Ok(Json(SignInResponse {
        token: signed_in.session.token,
        user: UserPayload {
            id: signed_in.user.id,
            name: signed_in.name,
            email: signed_in.user.email,
        },
    }))
}
