//! Reviewer scheduling interactions.
//!
//! Dialog submissions open a schedule, search for reviewers, or register
//! reviewers and challenges. Button clicks replay an availability or booking
//! toggle from the action-state token embedded in their action id. Every
//! failure becomes a chat message; only malformed events are returned as
//! handler errors.

use async_trait::async_trait;
use tracing::{info, warn};

use reviewdesk_core::domain::challenge::ChallengeId;
use reviewdesk_core::domain::reviewer::ReviewerId;
use reviewdesk_core::domain::slot::ReviewDay;
use reviewdesk_core::domain::week::WeekYear;
use reviewdesk_core::errors::{ApplicationError, DomainError};
use reviewdesk_core::scheduling::{
    NewChallenge, NewReviewer, SchedulingService, ToggleOutcome, TogglePlane, ToggleRequest,
};

use crate::blocks::{
    available_reviewers_message, booking_confirmation_message, error_message, help_message,
    info_message, no_reviewers_message, parse_toggle_action_id, reviewer_day_message,
    schedule_message, MessageTemplate, HELP_ACTION,
};
use crate::events::{
    BlockActionEvent, BlockActionService, ChatResponse, DialogSubmissionEvent,
    DialogSubmissionService, EventContext, EventHandlerError,
};

pub const SHOW_SCHEDULE_CALLBACK: &str = "show_schedule";
pub const FIND_REVIEWERS_CALLBACK: &str = "find_reviewers";
pub const NEW_REVIEWER_CALLBACK: &str = "new_reviewer";
pub const NEW_CHALLENGE_CALLBACK: &str = "new_challenge";
pub const EDIT_CHALLENGE_CALLBACK: &str = "edit_challenge";

const DEFAULT_REPO_NAME_FORMAT: &str = "test_CHALLENGENAME-GITHUBALIAS";

#[derive(Clone, Debug)]
pub struct ScheduleInteractions {
    service: SchedulingService,
}

impl ScheduleInteractions {
    pub fn new(service: SchedulingService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &SchedulingService {
        &self.service
    }

    async fn show_schedule(
        &self,
        event: &DialogSubmissionEvent,
        ctx: &EventContext,
    ) -> Result<MessageTemplate, ApplicationError> {
        let reviewer_id = event.state.as_deref().map(str::trim).filter(|id| !id.is_empty());
        let reviewer_id = ReviewerId(reviewer_id.unwrap_or(&event.user_id).to_string());
        let week = submitted_week(event)?;

        let view = self.service.show_schedule(&reviewer_id, week).await?;
        info!(
            event_name = "slack.schedule.shown",
            correlation_id = %ctx.correlation_id,
            reviewer_id = %reviewer_id.0,
            week = %week,
            slots = view.slots.len(),
            "rendered reviewer schedule"
        );
        Ok(schedule_message(self.service.codec(), &view.reviewer, week, &view.slots)?)
    }

    async fn find_reviewers(
        &self,
        event: &DialogSubmissionEvent,
        ctx: &EventContext,
    ) -> Result<MessageTemplate, ApplicationError> {
        let challenge_name = required_field(event, "challenge_name")?;
        let technology = required_field(event, "technology")?;
        let week = submitted_week(event)?;
        let day = match event.field("day") {
            Some(value) => Some(ReviewDay::parse(value).ok_or_else(|| {
                DomainError::UnknownSlot(format!("`{value}` is not a review day"))
            })?),
            None => None,
        };

        let results =
            match self.service.find_available_reviewers(challenge_name, technology, week).await {
                Ok(results) => results,
                Err(ApplicationError::NoReviewersFound { .. }) => {
                    return Ok(no_reviewers_message(day, week));
                }
                Err(error) => return Err(error),
            };
        if day.is_some_and(|day| results.day(day).is_none()) {
            return Ok(no_reviewers_message(day, week));
        }

        info!(
            event_name = "slack.reviewers.found",
            correlation_id = %ctx.correlation_id,
            challenge_name,
            technology,
            week = %week,
            days = results.days().count(),
            "rendered available reviewers"
        );
        Ok(available_reviewers_message(self.service.codec(), &results, day)?)
    }

    async fn new_reviewer(
        &self,
        event: &DialogSubmissionEvent,
        ctx: &EventContext,
    ) -> Result<MessageTemplate, ApplicationError> {
        let id = event.field("reviewer_id").unwrap_or(&event.user_id).to_string();
        let name = event.field("reviewer_name").unwrap_or(&id).to_string();
        let reviewer = self
            .service
            .register_reviewer(NewReviewer {
                id: ReviewerId(id),
                name,
                github_alias: event.field("github_alias").unwrap_or_default().to_string(),
                challenge_name: required_field(event, "challenge_name")?.to_string(),
                technologies: event.field("technologies").unwrap_or_default().to_string(),
            })
            .await?;

        info!(
            event_name = "slack.reviewer.registered",
            correlation_id = %ctx.correlation_id,
            reviewer_id = %reviewer.id.0,
            version = reviewer.version,
            "registered reviewer"
        );
        Ok(info_message(&format!(
            "We created a reviewer named {} in our database. They will be reviewing: {}, and their Github alias is: {}",
            reviewer.name, reviewer.challenge_name, reviewer.github_alias
        )))
    }

    async fn save_challenge(
        &self,
        event: &DialogSubmissionEvent,
        ctx: &EventContext,
    ) -> Result<MessageTemplate, ApplicationError> {
        let github_owner = event
            .field("github_owner")
            .or_else(|| event.field("github_account"))
            .unwrap_or_default()
            .to_string();
        let request = NewChallenge {
            name: required_field(event, "challenge_name")?.to_string(),
            github_owner,
            github_org: event.field("github_org").unwrap_or_default().to_string(),
            template_repo: event.field("template_repo").unwrap_or_default().to_string(),
            repo_name_format: event
                .field("repo_name_format")
                .unwrap_or(DEFAULT_REPO_NAME_FORMAT)
                .to_string(),
            technologies: event.field("technologies").unwrap_or_default().to_string(),
            review_hours: parse_review_hours(event.field("review_hours").unwrap_or_default())?,
            team_id: event.team_id.clone(),
        };
        // The edit dialog carries the challenge id in its state.
        let edited_id = match event.callback_id.as_str() {
            EDIT_CHALLENGE_CALLBACK => {
                event.state.as_deref().map(str::trim).filter(|id| !id.is_empty())
            }
            _ => None,
        };
        let challenge = match edited_id {
            Some(id) => self.service.edit_challenge(&ChallengeId(id.to_string()), request).await?,
            None => self.service.register_challenge(request).await?,
        };

        info!(
            event_name = "slack.challenge.saved",
            correlation_id = %ctx.correlation_id,
            challenge_id = %challenge.id.0,
            challenge_name = %challenge.name,
            "saved challenge"
        );
        let hours = challenge
            .review_hours
            .iter()
            .map(|hour| format!("{hour:02}:00"))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(info_message(&format!(
            "Challenge *{}* uses the template {} and offers review slots at {hours}. Review issues are tracked at {}.",
            challenge.name,
            challenge.template_repository_url(),
            challenge.tracking_issues_url()
        )))
    }

    async fn toggle(
        &self,
        event: &BlockActionEvent,
        plane: TogglePlane,
        token: &str,
        ctx: &EventContext,
    ) -> Result<Vec<ChatResponse>, ApplicationError> {
        let displayed = match event.value.as_deref() {
            Some("true") => true,
            Some("false") => false,
            other => {
                return Err(DomainError::MalformedActionInfo(format!(
                    "button value {other:?} is not a displayed flag"
                ))
                .into());
            }
        };

        let outcome = self
            .service
            .toggle(ToggleRequest { plane, displayed, token: token.to_string() })
            .await?;
        info!(
            event_name = "slack.schedule.toggled",
            correlation_id = %ctx.correlation_id,
            reviewer_id = %outcome.reviewer.id.0,
            week = %outcome.info.week,
            slot_id = %outcome.info.slot_id,
            plane = plane.as_str(),
            new_value = outcome.new_value,
            version = outcome.reviewer.version,
            "applied schedule toggle"
        );

        self.toggle_responses(event, &outcome)
    }

    fn toggle_responses(
        &self,
        event: &BlockActionEvent,
        outcome: &ToggleOutcome,
    ) -> Result<Vec<ChatResponse>, ApplicationError> {
        let codec = self.service.codec();
        let week = outcome.info.week;
        let responses = match outcome.plane {
            TogglePlane::Availability => vec![ChatResponse::ReplaceOriginal {
                response_url: event.response_url.clone(),
                message: schedule_message(codec, &outcome.reviewer, week, &outcome.slots)?,
            }],
            TogglePlane::Booking => vec![
                ChatResponse::ReplaceOriginal {
                    response_url: event.response_url.clone(),
                    message: reviewer_day_message(
                        codec,
                        &outcome.reviewer,
                        week,
                        outcome.info.slot_id.day(),
                        &outcome.slots,
                    )?,
                },
                ChatResponse::PostMessage {
                    channel_id: event.channel_id.clone(),
                    message: booking_confirmation_message(
                        &outcome.reviewer,
                        outcome.info.slot_id,
                        week,
                        outcome.new_value,
                    ),
                },
            ],
        };
        Ok(responses)
    }

    async fn failure_message(&self, error: ApplicationError, ctx: &EventContext) -> MessageTemplate {
        match error {
            ApplicationError::ReviewerNotRegistered { reviewer_id } => {
                info_message(&format!("Reviewer <@{reviewer_id}> is not registered."))
            }
            ApplicationError::ChallengeNotRegistered { challenge_name } => {
                let known = self.service.list_challenge_names().await.unwrap_or_default();
                let mut text = format!(
                    "Challenge named {challenge_name} is not registered. Please register first using /challenge new command."
                );
                if !known.is_empty() {
                    text.push_str(&format!(" Registered challenges: {}.", known.join(", ")));
                }
                info_message(&text)
            }
            error if error.is_informational() => info_message(&error.to_string()),
            error => {
                let interface = error.into_interface(ctx.correlation_id.clone());
                warn!(
                    event_name = "slack.interaction.failed",
                    correlation_id = %ctx.correlation_id,
                    error = %interface,
                    "interaction failed"
                );
                error_message(interface.user_message(), interface.correlation_id())
            }
        }
    }
}

fn required_field<'a>(
    event: &'a DialogSubmissionEvent,
    name: &str,
) -> Result<&'a str, DomainError> {
    event
        .field(name)
        .ok_or_else(|| DomainError::InvariantViolation(format!("`{name}` is required")))
}

fn submitted_week(event: &DialogSubmissionEvent) -> Result<WeekYear, DomainError> {
    WeekYear::from_token(required_field(event, "year_week")?)
}

/// Comma or whitespace separated hours, e.g. `"9, 10, 14"`.
fn parse_review_hours(input: &str) -> Result<Vec<u8>, DomainError> {
    input
        .split(|ch: char| ch == ',' || ch.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u8>().map_err(|_| {
                DomainError::InvariantViolation(format!("`{part}` is not a review hour"))
            })
        })
        .collect()
}

#[async_trait]
impl DialogSubmissionService for ScheduleInteractions {
    async fn handle_dialog_submission(
        &self,
        event: &DialogSubmissionEvent,
        ctx: &EventContext,
    ) -> Result<Vec<ChatResponse>, EventHandlerError> {
        let outcome = match event.callback_id.as_str() {
            SHOW_SCHEDULE_CALLBACK => self.show_schedule(event, ctx).await,
            FIND_REVIEWERS_CALLBACK => self.find_reviewers(event, ctx).await,
            NEW_REVIEWER_CALLBACK => self.new_reviewer(event, ctx).await,
            NEW_CHALLENGE_CALLBACK | EDIT_CHALLENGE_CALLBACK => {
                self.save_challenge(event, ctx).await
            }
            other => {
                return Err(EventHandlerError::InvalidSubmission {
                    callback_id: other.to_string(),
                    reason: "unknown dialog".to_string(),
                });
            }
        };

        let message = match outcome {
            Ok(message) => message,
            Err(error) => self.failure_message(error, ctx).await,
        };
        Ok(vec![ChatResponse::PostMessage { channel_id: event.channel_id.clone(), message }])
    }
}

#[async_trait]
impl BlockActionService for ScheduleInteractions {
    async fn handle_block_action(
        &self,
        event: &BlockActionEvent,
        ctx: &EventContext,
    ) -> Result<Vec<ChatResponse>, EventHandlerError> {
        if event.action_id == HELP_ACTION {
            return Ok(vec![ChatResponse::PostMessage {
                channel_id: event.channel_id.clone(),
                message: help_message(),
            }]);
        }

        let Some((plane, token)) = parse_toggle_action_id(&event.action_id) else {
            return Err(EventHandlerError::InvalidAction {
                action_id: event.action_id.clone(),
                reason: "not a schedule action".to_string(),
            });
        };

        match self.toggle(event, plane, token, ctx).await {
            Ok(responses) => Ok(responses),
            Err(error) => Ok(vec![ChatResponse::PostMessage {
                channel_id: event.channel_id.clone(),
                message: self.failure_message(error, ctx).await,
            }]),
        }
    }
}
