//! Account session lifecycle management
//!
//! The core of Subfleet: one external worker process per connected account,
//! supervised out-of-band through pid marker files, plus the multi-step
//! auth handshake that produces the session artifact a worker runs on.
//!
//! ```text
//! accounts/
//! ├── types.rs       identities, handshake state, tagged outcomes
//! ├── supervisor.rs  worker launch/liveness/stop (ProcessRegistry seam)
//! ├── transport.rs   protocol-client helper driver (AuthTransport seam)
//! ├── auth.rs        handshake coordination + input validation
//! └── lifecycle.rs   connect/disconnect/delete composition, per-phone locks
//! ```
//!
//! The conversation layer only ever talks to `AccountLifecycleService`; no
//! other path to process or session state is exposed.

pub mod auth;
pub mod lifecycle;
pub mod supervisor;
pub mod transport;
pub mod types;

pub use auth::AuthSessionCoordinator;
pub use lifecycle::AccountLifecycleService;
pub use supervisor::{OsProcessRegistry, ProcessRegistry, ProcessSupervisor, START_FAILED};
pub use transport::{AuthTransport, HelperTransport};
pub use types::{
    AccountIdentity, AuthFailure, CodeRequestOutcome, ConnectOutcome, HandshakeState,
    SignInOutcome,
};
