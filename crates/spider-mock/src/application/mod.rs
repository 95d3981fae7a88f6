//! Application layer for spider-mock.
//!
//! The command-protocol engine shared by both transport variants.  Everything
//! here is written against the traits in [`transport`] and [`advertiser`], so
//! the same session handler and shutdown coordinator drive WebSocket and
//! RFCOMM clients alike.
//!
//! # Control flow
//!
//! ```text
//! serve()
//!  ├─ run_acceptor()          accept until shutdown is requested
//!  │    └─ supervise_session()   one per client (spawned or inline)
//!  │         ├─ establish()        transport upgrade, then register
//!  │         └─ run_session()      read → classify → log → optional ack
//!  └─ ShutdownCoordinator::shutdown()
//!         close sessions → retract advertisement → close listener → summary
//! ```

pub mod acceptor;
pub mod advertiser;
pub mod serve;
pub mod session;
pub mod shutdown;
pub mod state;
pub mod transport;

pub use acceptor::{run_acceptor, SessionPolicy};
pub use advertiser::{publish, AdvertiseError, ServiceAdvertiser};
pub use serve::serve;
pub use session::{establish, process_message, run_session, SessionEnd};
pub use shutdown::{RetractionOutcome, ShutdownCoordinator, ShutdownReport};
pub use state::{ServerState, SessionHandle, SessionId, ShutdownPhase};
pub use transport::{Accepted, CommandConnection, CommandListener, TransportError};
