//! Route resolution and the app gate for the Committed routing engine.
//!
//! [`resolve`] is the pure decision table: given the settled auth state,
//! it computes the single canonical route the user must be on (or "no
//! decision yet" while state is still resolving).
//!
//! [`AppGate`] is the one component allowed to issue auth-driven
//! navigation. It renders a loading placeholder while hydrating, defers
//! to in-flight link exchanges, replays pending content routes, and
//! suppresses redirect loops so each genuine state transition produces at
//! most one navigation call.

mod gate;
mod resolver;

pub use gate::{AppGate, GateRender, GateSnapshot, Navigator};
pub use resolver::{resolve, RouteInput, RoutePath, UserGates};
