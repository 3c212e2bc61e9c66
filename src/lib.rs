//! Manipulation core for the multi-user spatial board.
//!
//! This crate owns everything that happens between a pointer event and the
//! positions a view layer draws: drag and resize sessions, container
//! membership with hysteresis, the merge of local and remote in-flight
//! positions, outgoing broadcast throttling, viewport culling, and the
//! undo/redo history. Rendering, persistence and transport are collaborators;
//! the core talks to them through the [`engine::Action`]s it returns and the
//! messages it accepts.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Facade that wires the components together |
//! | [`doc`] | Confirmed objects, connectors and the membership index |
//! | [`containment`] | Overlap ratios, hysteresis and push-out geometry |
//! | [`session`] | Drag / resize / draw gesture value objects |
//! | [`controller`] | Per-frame gesture computation and commit |
//! | [`merge`] | Confirmed + local + remote position composition |
//! | [`remote`] | Remote previews with grace clear and stale GC |
//! | [`broadcast`] | Outgoing throttle, heartbeat and drag-end flush |
//! | [`viewport`] | Camera and hysteresis-gated culling |
//! | [`undo`] | Bounded command history |
//! | [`wire`] | Position message codec |
//! | [`bridge`] | tokio adapter for ticking and forwarding actions |
//! | [`config`] | Tunables with environment overrides |
//! | [`consts`] | Default numeric constants |
//! | [`geom`] | Point and rectangle primitives |

pub mod bridge;
pub mod broadcast;
pub mod config;
pub mod consts;
pub mod containment;
pub mod controller;
pub mod doc;
pub mod engine;
pub mod geom;
pub mod merge;
pub mod remote;
pub mod session;
pub mod undo;
pub mod viewport;
pub mod wire;
