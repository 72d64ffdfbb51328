use serde::Serialize;
use thiserror::Error;

use tenderflow_core::EmployeeId;
use tenderflow_tenders::TenderStatus;

use crate::{Employee, TenderAction};

/// Tender state an authorization decision is made against.
///
/// Built fresh for every decision from the current tender row and the
/// responsibility relation; never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessContext {
    pub status: TenderStatus,
    /// Whether the acting employee is responsible for the tender's organization.
    pub is_responsible: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("invalid action '{0}'")]
    InvalidAction(String),

    #[error("forbidden: {action} not permitted ({reason})")]
    Forbidden { action: TenderAction, reason: String },
}

/// Per-action policy.
///
/// - `create`, `close`: responsible employees only
/// - `publish`: any resolved employee
/// - `edit`: responsible employees, or anyone once the tender is published
pub fn is_allowed(action: TenderAction, ctx: AccessContext) -> bool {
    match action {
        TenderAction::Create | TenderAction::Close => ctx.is_responsible,
        TenderAction::Publish => true,
        TenderAction::Edit => ctx.is_responsible || ctx.status == TenderStatus::Published,
    }
}

/// Authorize `action` against `ctx`.
///
/// - No IO
/// - No panics
pub fn authorize(action: TenderAction, ctx: AccessContext) -> Result<(), AuthzError> {
    if is_allowed(action, ctx) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            action,
            reason: denial_message(action, ctx),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub action: TenderAction,
    pub granted: bool,
    /// Human-readable reason for the decision.
    pub reason: String,
    pub subject: SubjectState,
    pub denial_reason: Option<DenialReason>,
}

/// What the decision saw about the acting employee and the tender.
#[derive(Debug, Clone, Serialize)]
pub struct SubjectState {
    pub employee_id: EmployeeId,
    pub username: String,
    pub is_responsible: bool,
    pub tender_status: TenderStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    NotResponsible,
    NotPublished,
}

/// Explain why `employee` may or may not perform `action`.
///
/// Answers the same question as [`authorize`], with enough detail to tell a
/// caller what would have to change for a denial to become a grant.
pub fn explain_authorization(
    employee: &Employee,
    action: TenderAction,
    ctx: AccessContext,
) -> AuthorizationExplanation {
    let subject = SubjectState {
        employee_id: employee.id,
        username: employee.username.as_str().to_string(),
        is_responsible: ctx.is_responsible,
        tender_status: ctx.status,
    };

    if is_allowed(action, ctx) {
        return AuthorizationExplanation {
            action,
            granted: true,
            reason: grant_reason(action, ctx),
            subject,
            denial_reason: None,
        };
    }

    let (kind, suggestions) = match action {
        TenderAction::Edit => (
            DenialKind::NotPublished,
            vec![
                "Ask an employee responsible for the tender's organization to make the edit"
                    .to_string(),
                "Wait until the tender is published; published tenders are open for editing"
                    .to_string(),
            ],
        ),
        _ => (
            DenialKind::NotResponsible,
            vec![format!(
                "Register '{}' as responsible for the tender's organization",
                employee.username
            )],
        ),
    };

    AuthorizationExplanation {
        action,
        granted: false,
        reason: denial_message(action, ctx),
        subject,
        denial_reason: Some(DenialReason {
            kind,
            message: denial_message(action, ctx),
            suggestions,
        }),
    }
}

fn grant_reason(action: TenderAction, ctx: AccessContext) -> String {
    match action {
        TenderAction::Publish => "publish is open to every known employee".to_string(),
        TenderAction::Edit if !ctx.is_responsible => {
            "tender is PUBLISHED and therefore editable by any employee".to_string()
        }
        _ => format!("employee is responsible for the tender's organization ({action})"),
    }
}

fn denial_message(action: TenderAction, ctx: AccessContext) -> String {
    match action {
        TenderAction::Edit => format!(
            "employee is not responsible for the tender's organization and the tender is {}",
            ctx.status
        ),
        _ => format!("employee is not responsible for the tender's organization ({action})"),
    }
}
