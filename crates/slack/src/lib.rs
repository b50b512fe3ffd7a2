//! Slack interface for reviewer scheduling.
//!
//! - **Socket Mode** (`socket`) - envelope loop with acknowledgement, per-envelope tasks and reconnects
//! - **Events** (`events`) - dialog submissions and block actions routed to services
//! - **Schedule** (`schedule`) - dialog and button handlers backed by `SchedulingService`
//! - **Block Kit** (`blocks`) - schedule, search result and confirmation messages
//!
//! # Architecture
//!
//! ```text
//! Slack envelope → SocketModeRunner → EventDispatcher → ScheduleInteractions → SchedulingService
//!                        ↓
//!                  ResponseSink ← ChatResponse (Block Kit)
//! ```
//!
//! Schedule buttons carry their own state: the action id holds a signed
//! action-state token naming reviewer, slot and week, and the button value
//! holds the flag it displayed when rendered.

pub mod blocks;
pub mod events;
pub mod schedule;
pub mod socket;
