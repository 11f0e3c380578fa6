//! The elaborator stage of the front end: it consumes the parser's syntax
//! trees command by command, resolves names against the evolving scope
//! stack, translates terms into kernel pre-terms, and hands the resulting
//! declarations to the kernel. Parsing and type checking live elsewhere;
//! the only state flowing back out is the notation-extended parser
//! configuration.

use anyhow::bail;

pub mod cmd;
pub mod diag;
pub mod elab;
pub mod env;
pub mod name;
pub mod notation;
pub mod pexpr;
mod print;
pub mod rbmap;
pub mod resolve;
pub mod scope;
pub mod source;
pub mod state;
pub mod syntax;

pub use cmd::{elab_commands, Command, Dispatcher};
pub use diag::{Diagnostic, ElabError, Severity};
pub use env::Env;
pub use name::Name;
pub use state::{ElabState, FrontendConfig};

/// Elaborates one module. Failures inside individual commands are folded
/// into the returned state's message log; the driver itself does not fail.
pub fn process(
    cfg: &FrontendConfig,
    imported: Env,
    commands: &[Command],
) -> ElabState {
    let dispatcher = Dispatcher::new();
    elab_commands(&dispatcher, cfg, imported, commands)
}

/// Like [`process`], but requires a clean run: the accumulated environment
/// is returned only if the log contains no errors.
pub fn check(
    cfg: &FrontendConfig,
    imported: Env,
    commands: &[Command],
) -> anyhow::Result<Env> {
    let state = process(cfg, imported, commands);
    for message in &state.messages {
        if message.severity == Severity::Error {
            bail!("{}", message);
        }
    }
    Ok(state.env)
}
