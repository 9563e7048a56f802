//! The statically registered schemas. The flight family is legacy
//! scaffolding from the booking demo this assistant grew out of; the loan
//! application schema is the one the tool pipeline actually extracts against.

use super::{Field, FieldType, Schema};

pub const LOAN_APPLICATION_SCHEMA: &str = "loan_application";

pub(super) fn all() -> Vec<Schema> {
    vec![
        flight_status(),
        flight_search_result(),
        seat(),
        reservation_price(),
        loan_application(),
    ]
}

fn endpoint_fields(city_hint: &'static str) -> Vec<Field> {
    vec![
        Field::required("cityName", FieldType::String, city_hint),
        Field::required("airportCode", FieldType::String, "IATA code of the airport"),
        Field::required("airportName", FieldType::String, "Full name of the airport"),
        Field::required("timestamp", FieldType::String, "ISO 8601 date and time"),
        Field::required("terminal", FieldType::String, "Terminal"),
        Field::required("gate", FieldType::String, "Gate"),
    ]
}

fn flight_status() -> Schema {
    Schema::new(
        "flight_status",
        vec![
            Field::required(
                "flightNumber",
                FieldType::String,
                "Flight number, e.g., BA123, AA31",
            ),
            Field::required(
                "departure",
                FieldType::Object(endpoint_fields("Name of the departure city")),
                "Departure details",
            ),
            Field::required(
                "arrival",
                FieldType::Object(endpoint_fields("Name of the arrival city")),
                "Arrival details",
            ),
            Field::required(
                "totalDistanceInMiles",
                FieldType::Number,
                "Total flight distance in miles",
            ),
        ],
    )
}

fn flight_search_result() -> Schema {
    let leg = |city_hint| {
        FieldType::Object(vec![
            Field::required("cityName", FieldType::String, city_hint),
            Field::required("airportCode", FieldType::String, "IATA code of the airport"),
            Field::required("timestamp", FieldType::String, "ISO 8601 date and time"),
        ])
    };

    Schema::new(
        "flight_search_result",
        vec![
            Field::required(
                "id",
                FieldType::String,
                "Unique identifier for the flight, like BA123, AA31, etc.",
            ),
            Field::required(
                "departure",
                leg("Name of the departure city"),
                "Departure details",
            ),
            Field::required("arrival", leg("Name of the arrival city"), "Arrival details"),
            Field::required(
                "airlines",
                FieldType::Array(Box::new(FieldType::String)),
                "Airline names, e.g., American Airlines, Emirates",
            ),
            Field::required("priceInUSD", FieldType::Number, "Flight price in US dollars"),
            Field::required(
                "numberOfStops",
                FieldType::Integer,
                "Number of stops during the flight",
            ),
        ],
    )
}

fn seat() -> Schema {
    Schema::new(
        "seat",
        vec![
            Field::required("seatNumber", FieldType::String, "Seat identifier, e.g., 12A, 15C"),
            Field::required(
                "priceInUSD",
                FieldType::Number,
                "Seat price in US dollars, less than $99",
            ),
            Field::required(
                "isAvailable",
                FieldType::Boolean,
                "Whether the seat is available for booking",
            ),
        ],
    )
}

fn reservation_price() -> Schema {
    Schema::new(
        "reservation_price",
        vec![Field::required(
            "totalPriceInUSD",
            FieldType::Number,
            "Total reservation price in US dollars",
        )],
    )
}

fn loan_application() -> Schema {
    Schema::new(
        LOAN_APPLICATION_SCHEMA,
        vec![
            Field::required(
                "personalData",
                FieldType::Object(vec![
                    Field::required(
                        "individualId",
                        FieldType::Integer,
                        "Unique identifier for the applicant",
                    ),
                    Field::required("primaryLastName", FieldType::String, "Applicant's last name"),
                    Field::required(
                        "primaryFirstName",
                        FieldType::String,
                        "Applicant's first name",
                    ),
                    Field::optional(
                        "primaryMiddleName",
                        FieldType::String,
                        "Applicant's middle name",
                    ),
                    Field::required("usedName", FieldType::String, "Used name or preferred name"),
                    Field::required("primaryTitle", FieldType::String, "Applicant's title"),
                    Field::required("gender", FieldType::String, "Applicant's gender"),
                    Field::required("civilState", FieldType::String, "Civil status of the applicant"),
                    Field::required("race", FieldType::String, "Race of the applicant"),
                    Field::required("dob", FieldType::String, "Date of birth in ISO format"),
                    Field::required("nationality", FieldType::String, "Applicant's nationality"),
                    Field::required(
                        "applicantType",
                        FieldType::String,
                        "Type of applicant (e.g., individual)",
                    ),
                    Field::required("loanAmount", FieldType::Number, "Requested loan amount"),
                    Field::required("loanPurpose", FieldType::String, "Purpose of the loan"),
                    Field::required("interestRate", FieldType::Number, "Loan interest rate"),
                    Field::required(
                        "loanFrequency",
                        FieldType::String,
                        "Repayment frequency (e.g., monthly)",
                    ),
                    Field::required("loanTerms", FieldType::Integer, "Loan term in years"),
                ]),
                "Personal and loan data",
            ),
            Field::required(
                "contactData",
                FieldType::Object(vec![
                    Field::required("primaryContact", FieldType::String, "Primary contact number"),
                    Field::required("primaryEmail", FieldType::String, "Primary email address"),
                    Field::required(
                        "relationship",
                        FieldType::String,
                        "Relationship to main applicant",
                    ),
                    Field::required("relationName", FieldType::String, "Name of the related person"),
                    Field::required(
                        "relationLandNumber",
                        FieldType::String,
                        "Landline number of related person",
                    ),
                ]),
                "Contact data",
            ),
            Field::required(
                "addressData",
                FieldType::Object(vec![
                    Field::required(
                        "permanentAddress",
                        FieldType::String,
                        "Permanent address of the applicant",
                    ),
                    Field::required(
                        "mailingAddressData",
                        FieldType::String,
                        "Mailing address of the applicant",
                    ),
                    Field::required(
                        "currentAddressData",
                        FieldType::String,
                        "Current address of the applicant",
                    ),
                    Field::required(
                        "residentialState",
                        FieldType::String,
                        "Current residential status",
                    ),
                    Field::required(
                        "currentResidenceYears",
                        FieldType::Integer,
                        "Number of years in current residence",
                    ),
                    Field::required(
                        "currentResidenceMonths",
                        FieldType::Integer,
                        "Number of months in current residence",
                    ),
                ]),
                "Address data",
            ),
            Field::required(
                "educationData",
                FieldType::Object(vec![Field::required(
                    "primaryEducationGrade",
                    FieldType::String,
                    "Highest grade or level of education",
                )]),
                "Education data",
            ),
            Field::required(
                "incomeData",
                FieldType::Object(vec![
                    Field::required(
                        "personnelIncome",
                        FieldType::String,
                        "Personal income of the applicant",
                    ),
                    Field::required(
                        "businessIncome",
                        FieldType::String,
                        "Business income, if applicable",
                    ),
                ]),
                "Income data",
            ),
            Field::required(
                "securityData",
                FieldType::Object(vec![
                    Field::required(
                        "securityType",
                        FieldType::String,
                        "Type of security (if any) for the loan",
                    ),
                    Field::required(
                        "movable",
                        FieldType::String,
                        "Movable assets as security (if any)",
                    ),
                ]),
                "Security data",
            ),
            Field::required(
                "expenseData",
                FieldType::Object(vec![
                    Field::required(
                        "numberOfDepends",
                        FieldType::Integer,
                        "Number of dependents of the applicant",
                    ),
                    Field::required(
                        "expenses",
                        FieldType::String,
                        "Monthly expenses of the applicant",
                    ),
                ]),
                "Expense data",
            ),
            Field::required(
                "inquiryOfObligationsData",
                FieldType::Object(vec![Field::required(
                    "totalLiabilityAmount",
                    FieldType::String,
                    "Total liability amount of the applicant",
                )]),
                "Obligations data",
            ),
        ],
    )
}
