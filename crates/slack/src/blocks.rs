use serde::Serialize;

use reviewdesk_core::codec::{ActionInfoCodec, ScheduleActionInfo};
use reviewdesk_core::domain::reviewer::Reviewer;
use reviewdesk_core::domain::slot::{ReviewDay, Slot, SlotId};
use reviewdesk_core::domain::week::WeekYear;
use reviewdesk_core::errors::DomainError;
use reviewdesk_core::scheduling::{
    AvailabilityByDay, ReviewerAvailability, SlotAvailability, TogglePlane,
};

pub const AVAILABILITY_ACTION: &str = "schedule.availability.v1";
pub const BOOKING_ACTION: &str = "schedule.booking.v1";
pub const HELP_ACTION: &str = "reviewdesk.help.v1";

/// Slack caps an actions block at this many elements.
const MAX_ACTION_ELEMENTS: usize = 25;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    #[serde(rename = "plain_text")]
    Plain { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Plain { text } | Self::Mrkdwn { text } => text,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "button")]
pub struct ButtonElement {
    pub action_id: String,
    pub text: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ButtonStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ButtonElement {
    pub fn new(action_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { action_id: action_id.into(), text: TextObject::plain(label), style: None, value: None }
    }

    pub fn maybe_style(mut self, style: Option<ButtonStyle>) -> Self {
        self.style = style;
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header { block_id: String, text: TextObject },
    Section { block_id: String, text: TextObject },
    Actions { block_id: String, elements: Vec<ButtonElement> },
    Context { block_id: String, elements: Vec<TextObject> },
    Divider { block_id: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    #[serde(rename = "text")]
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

impl MessageTemplate {
    /// Every button in the message, in rendering order.
    pub fn buttons(&self) -> impl Iterator<Item = &ButtonElement> {
        self.blocks.iter().flat_map(|block| match block {
            Block::Actions { elements, .. } => elements.as_slice(),
            _ => &[][..],
        })
    }
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn header(mut self, block_id: impl Into<String>, text: impl Into<String>) -> Self {
        self.blocks.push(Block::Header { block_id: block_id.into(), text: TextObject::plain(text) });
        self
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Section { block_id: block_id.into(), text: builder.build() });
        self
    }

    /// Adds the buttons in as many actions blocks as the element cap requires,
    /// suffixing block ids after the first with `.2`, `.3`, ...
    pub fn actions<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let block_id = block_id.into();
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        for (index, chunk) in builder.build().chunks(MAX_ACTION_ELEMENTS).enumerate() {
            let block_id =
                if index == 0 { block_id.clone() } else { format!("{block_id}.{}", index + 1) };
            self.blocks.push(Block::Actions { block_id, elements: chunk.to_vec() });
        }
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn divider(mut self, block_id: impl Into<String>) -> Self {
        self.blocks.push(Block::Divider { block_id: block_id.into() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> TextObject {
        self.text.unwrap_or_else(|| TextObject::plain(" "))
    }
}

#[derive(Default)]
pub struct ActionsBuilder {
    elements: Vec<ButtonElement>,
}

impl ActionsBuilder {
    pub fn button(&mut self, button: ButtonElement) -> &mut Self {
        self.elements.push(button);
        self
    }

    fn build(self) -> Vec<ButtonElement> {
        self.elements
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

/// Action id of a toggle button: `<plane prefix>:<action-state token>`.
pub fn toggle_action_id(plane: TogglePlane, token: &str) -> String {
    let prefix = match plane {
        TogglePlane::Availability => AVAILABILITY_ACTION,
        TogglePlane::Booking => BOOKING_ACTION,
    };
    format!("{prefix}:{token}")
}

/// Splits a toggle action id into its plane and token. Other action ids
/// yield `None`.
pub fn parse_toggle_action_id(action_id: &str) -> Option<(TogglePlane, &str)> {
    let (prefix, token) = action_id.split_once(':')?;
    let plane = match prefix {
        AVAILABILITY_ACTION => TogglePlane::Availability,
        BOOKING_ACTION => TogglePlane::Booking,
        _ => return None,
    };
    Some((plane, token))
}

fn flag_value(flag: bool) -> &'static str {
    if flag {
        "true"
    } else {
        "false"
    }
}

fn toggle_button(
    codec: &ActionInfoCodec,
    plane: TogglePlane,
    info: &ScheduleActionInfo,
    label: String,
    displayed: bool,
) -> Result<ButtonElement, DomainError> {
    let token = codec.encode(info)?;
    Ok(ButtonElement::new(toggle_action_id(plane, &token), label)
        .maybe_style(displayed.then_some(ButtonStyle::Primary))
        .value(flag_value(displayed)))
}

/// A reviewer's week as one actions row per day. Each button shows the
/// stored availability of its slot and toggles it when clicked.
pub fn schedule_message(
    codec: &ActionInfoCodec,
    reviewer: &Reviewer,
    week: WeekYear,
    slots: &[Slot],
) -> Result<MessageTemplate, DomainError> {
    let title = format!("{} schedule for week #: {}", reviewer.name, week.week());
    let mut builder = MessageBuilder::new(title.clone())
        .header("schedule.header.v1", title)
        .context("schedule.week.v1", |context| {
            context.plain(format!(
                "Week {week}, {} to {}. Click a slot to change your availability.",
                week.monday(),
                week.date_of(ReviewDay::Friday)
            ));
        });

    for day in ReviewDay::ALL {
        let day_slots = slots.iter().filter(|slot| slot.id.day() == day).collect::<Vec<_>>();
        let Some(first) = day_slots.first() else { continue };
        let buttons = day_slots
            .iter()
            .map(|slot| {
                let info =
                    ScheduleActionInfo { reviewer_id: reviewer.id.clone(), slot_id: slot.id, week };
                let label = match (slot.available, slot.booked) {
                    (_, true) => format!("{} booked", slot.id.time_label()),
                    (true, false) => format!("{} available", slot.id.time_label()),
                    (false, false) => slot.id.time_label(),
                };
                toggle_button(codec, TogglePlane::Availability, &info, label, slot.available)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let short = day.short().to_ascii_lowercase();
        builder = builder
            .section(format!("schedule.day.{short}.v1"), |section| {
                section.mrkdwn(format!("*{}* {}", day.name(), first.date));
            })
            .actions(format!("schedule.slots.{short}.v1"), |actions| {
                for button in buttons {
                    actions.button(button);
                }
            });
    }

    Ok(builder.build())
}

fn reviewer_rows(
    builder: MessageBuilder,
    codec: &ActionInfoCodec,
    week: WeekYear,
    day: ReviewDay,
    reviewers: &[ReviewerAvailability],
) -> Result<MessageBuilder, DomainError> {
    let short = day.short().to_ascii_lowercase();
    reviewers.iter().try_fold(builder, |builder, reviewer| {
        let buttons = reviewer
            .slots
            .iter()
            .map(|slot| {
                let info = ScheduleActionInfo {
                    reviewer_id: reviewer.reviewer_id.clone(),
                    slot_id: slot.slot_id,
                    week,
                };
                let label = if slot.booked {
                    format!("{} booked", slot.slot_id.time_label())
                } else {
                    format!("Book {}", slot.slot_id.time_label())
                };
                toggle_button(codec, TogglePlane::Booking, &info, label, slot.booked)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let block_key = format!("{short}.{}", reviewer.reviewer_id.0.to_ascii_lowercase());
        Ok(builder
            .section(format!("reviewers.{block_key}.v1"), |section| {
                section.mrkdwn(format!(
                    "<@{}|{}> (GitHub `{}`)",
                    reviewer.reviewer_id.0, reviewer.name, reviewer.github_alias
                ));
            })
            .actions(format!("reviewers.{block_key}.slots.v1"), |actions| {
                for button in buttons {
                    actions.button(button);
                }
            }))
    })
}

/// Search results. With `day` set only that day is rendered; callers check
/// for its presence first.
pub fn available_reviewers_message(
    codec: &ActionInfoCodec,
    results: &AvailabilityByDay,
    day: Option<ReviewDay>,
) -> Result<MessageTemplate, DomainError> {
    let week = results.week();
    let title = match day {
        Some(day) => format!("Reviewers available on {} of week {week}", day.name()),
        None => format!("Reviewers available in week {week}"),
    };

    let mut builder = MessageBuilder::new(title.clone()).header("reviewers.header.v1", title);
    for (current, reviewers) in results.days() {
        if day.is_some_and(|day| day != current) {
            continue;
        }
        let short = current.short().to_ascii_lowercase();
        builder = builder.section(format!("reviewers.day.{short}.v1"), |section| {
            section.mrkdwn(format!("*{}* {}", current.name(), week.date_of(current)));
        });
        builder = reviewer_rows(builder, codec, week, current, reviewers)?;
        builder = builder.divider(format!("reviewers.day.{short}.end.v1"));
    }

    Ok(builder
        .context("reviewers.context.v1", |context| {
            context.plain("Click a slot to book it, click a booked slot to free it.");
        })
        .build())
}

/// One reviewer's bookable slots on `day`, rendered after a booking click in
/// place of the search result that was clicked.
pub fn reviewer_day_message(
    codec: &ActionInfoCodec,
    reviewer: &Reviewer,
    week: WeekYear,
    day: ReviewDay,
    slots: &[Slot],
) -> Result<MessageTemplate, DomainError> {
    let row = ReviewerAvailability {
        reviewer_id: reviewer.id.clone(),
        name: reviewer.name.clone(),
        github_alias: reviewer.github_alias.clone(),
        slots: slots
            .iter()
            .filter(|slot| slot.available && slot.id.day() == day)
            .map(|slot| SlotAvailability { slot_id: slot.id, date: slot.date, booked: slot.booked })
            .collect(),
    };

    let title = format!("{} on {} of week {week}", reviewer.name, day.name());
    let builder = MessageBuilder::new(title.clone()).header("reviewers.header.v1", title);
    Ok(reviewer_rows(builder, codec, week, day, std::slice::from_ref(&row))?.build())
}

pub fn no_reviewers_message(day: Option<ReviewDay>, week: WeekYear) -> MessageTemplate {
    let text = match day {
        Some(day) => format!(
            "No reviewers available for {} on the week of {}, {}",
            day.name(),
            week.week(),
            week.year()
        ),
        None => format!("No reviewers available on the week of {}, {}", week.week(), week.year()),
    };
    MessageBuilder::new(text.clone())
        .section("reviewdesk.info.v1", |section| {
            section.mrkdwn(text);
        })
        .actions("reviewdesk.help.actions.v1", |actions| {
            actions.button(ButtonElement::new(HELP_ACTION, "How does this work?"));
        })
        .build()
}

pub fn booking_confirmation_message(
    reviewer: &Reviewer,
    slot_id: SlotId,
    week: WeekYear,
    booked: bool,
) -> MessageTemplate {
    let state = if booked { "now booked" } else { "now free" };
    let text = format!(
        "<@{}|{}> is {state} for the slot {slot_id} on week {}",
        reviewer.id.0,
        reviewer.name,
        week.week()
    );
    MessageBuilder::new(text.clone())
        .section("booking.confirmation.v1", |section| {
            section.mrkdwn(text);
        })
        .build()
}

pub fn info_message(text: &str) -> MessageTemplate {
    MessageBuilder::new(text.to_string())
        .section("reviewdesk.info.v1", |section| {
            section.mrkdwn(text);
        })
        .build()
}

pub fn error_message(summary: &str, correlation_id: &str) -> MessageTemplate {
    MessageBuilder::new(summary.to_string())
        .section("reviewdesk.error.summary.v1", |section| {
            section.mrkdwn(format!(":warning: {summary}"));
        })
        .context("reviewdesk.error.context.v1", |context| {
            context.plain(format!("Correlation ID: {correlation_id}"));
        })
        .build()
}

pub fn help_message() -> MessageTemplate {
    MessageBuilder::new("Reviewer scheduling help")
        .section("reviewdesk.help.summary.v1", |section| {
            section.mrkdwn(
                "*Reviewer scheduling*\n• `/reviewer new` registers a reviewer\n• `/reviewer schedule` shows a week to mark availability\n• `/reviewer find` lists reviewers free on a day\n• `/challenge new` and `/challenge edit` manage challenges",
            );
        })
        .build()
}
