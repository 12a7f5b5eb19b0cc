//! Deep-link classification for the Committed app.
//!
//! A deep link arrives as a raw string from any of the platform URL
//! channels (foreground URL event, cold-start initial URL, web hash
//! re-read). [`parse`] classifies it into a structured intent without ever
//! failing: anything unrecognizable or malformed collapses to `None` and
//! the caller takes no deep-link action.
//!
//! Classification precedence (first match wins):
//!
//! 1. **auth** — the string contains `code=`, `access_token=`,
//!    `type=recovery`, or `auth-callback`
//! 2. **referral** — a referral code query parameter on the landing,
//!    auth, signup, or referral pages
//! 3. **post** — path `/post/<id>`
//! 4. **reel** — path `/reel/<id>`
//!
//! The parser is a pure function: no I/O, no shared state, identical
//! output for identical input.

mod parse;
mod types;

pub use parse::{parse, query_param};
pub use types::ParsedLink;
