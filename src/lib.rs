pub mod circuit;
pub mod cli;
pub mod error;
pub mod merger;
pub mod netlist;
pub mod nets;
pub mod parser;
pub mod snapshot;
pub mod validator;

mod renumber;

// Re-export commonly used types
pub use circuit::{CheckState, Circuit, Component, ComponentId, ComponentKind, Terminal, Wire, WireId};
pub use error::{CircuitError, ConflictError, NetIdError, NotChecked, ValidationError};
pub use netlist::{NetlistExporter, NetlistRecord};
pub use nets::{NetId, NetTable, GROUND_NET};
pub use parser::{Script, ScriptParser};
pub use snapshot::CircuitSnapshot;

// Error types
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
