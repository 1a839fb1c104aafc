//! Converts the OS interrupt signal into a cooperative abort.
//!
//! A signal handler cannot safely touch interpreter state, so the listener
//! only flips a request flag. While a protected call is armed, a checkpoint
//! hook installed in the runtime polls that flag every
//! [`CHECKPOINT_INTERVAL`] instructions and raises an `interrupted!` error
//! from inside the evaluation, where unwinding is safe.
//!
//! ```text
//! Idle --arm--> Armed --signal--> Pending --checkpoint--> Triggered
//!   ^             |                  |                        |
//!   +-----------------------disarm---+------------------------+
//! ```
//!
//! When nothing is armed, or an abort is already pending, the listener
//! performs the default action for the signal, so a second Ctrl-C during a
//! stuck evaluation still terminates the process.

use std::cell::Cell;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use mlua::{HookTriggers, Lua, VmState};
use signal_hook::consts::SIGINT;
use tracing::{debug, warn};

/// Number of VM instructions between two checks of the abort request.
pub const CHECKPOINT_INTERVAL: u32 = 1000;

/// Error text raised inside an aborted evaluation.
pub const INTERRUPTED_MESSAGE: &str = "interrupted!";

const IDLE: u8 = 0;
const ARMED: u8 = 1;
const PENDING: u8 = 2;
const TRIGGERED: u8 = 3;

/// Observable state of the interrupt bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// No protected call is running.
    Idle,
    /// A protected call is running and no abort was requested.
    Armed,
    /// An abort was requested and awaits the next checkpoint.
    Pending,
    /// The checkpoint raised the abort.
    Triggered,
}

static STATE: AtomicU8 = AtomicU8::new(IDLE);
static SLOT: Mutex<()> = Mutex::new(());
static LISTENER: OnceLock<bool> = OnceLock::new();

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Returns the current bridge state.
#[must_use]
pub fn state() -> BridgeState {
    match STATE.load(Ordering::SeqCst) {
        ARMED => BridgeState::Armed,
        PENDING => BridgeState::Pending,
        TRIGGERED => BridgeState::Triggered,
        _ => BridgeState::Idle,
    }
}

/// Requests an abort of the armed evaluation.
///
/// Returns false, without effect, when no evaluation is armed or an abort is
/// already pending. Only touches an atomic, so it may run in signal context.
pub fn request_abort() -> bool {
    STATE
        .compare_exchange(ARMED, PENDING, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
}

fn on_signal() {
    if !request_abort() {
        default_action();
    }
}

#[cfg(unix)]
fn default_action() {
    // Nothing useful can be done from signal context if this fails.
    let _ = signal_hook::low_level::emulate_default_handler(SIGINT);
}

#[cfg(not(unix))]
fn default_action() {
    std::process::abort();
}

/// Installs the process-wide signal listener once.
fn install_listener() {
    LISTENER.get_or_init(|| {
        // SAFETY: `on_signal` only performs atomic operations and re-raises
        // the signal with its default disposition, both async-signal-safe.
        match unsafe { signal_hook::low_level::register(SIGINT, on_signal) } {
            Ok(_) => {
                debug!("interrupt listener installed");
                true
            }
            Err(e) => {
                warn!(error = %e, "cannot install interrupt listener");
                false
            }
        }
    });
}

fn checkpoint(lua: &Lua) -> mlua::Result<VmState> {
    if STATE
        .compare_exchange(PENDING, TRIGGERED, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
    {
        lua.remove_hook();
        debug!("interrupt triggered at checkpoint");
        return Err(mlua::Error::runtime(INTERRUPTED_MESSAGE));
    }
    Ok(VmState::Continue)
}

/// Arms the bridge for one protected call on `lua`.
///
/// Only one call is armed per process; callers on other threads wait for the
/// slot. A nested call on the same thread shares the outer call's arming.
/// The bridge is disarmed when the returned guard is dropped.
#[must_use = "the bridge is disarmed when the guard is dropped"]
pub fn arm(lua: &Lua) -> ArmedCall<'_> {
    let depth = DEPTH.with(|d| {
        let depth = d.get();
        d.set(depth + 1);
        depth
    });
    if depth > 0 {
        return ArmedCall {
            lua,
            outermost: false,
            _slot: None,
        };
    }

    install_listener();
    let slot = SLOT.lock().unwrap_or_else(PoisonError::into_inner);
    STATE.store(ARMED, Ordering::SeqCst);
    lua.set_hook(
        HookTriggers::new().every_nth_instruction(CHECKPOINT_INTERVAL),
        |lua, _debug| checkpoint(lua),
    );
    debug!("interrupt bridge armed");

    ArmedCall {
        lua,
        outermost: true,
        _slot: Some(slot),
    }
}

/// Guard for an armed protected call.
pub struct ArmedCall<'lua> {
    lua: &'lua Lua,
    outermost: bool,
    _slot: Option<MutexGuard<'static, ()>>,
}

impl ArmedCall<'_> {
    /// Whether the checkpoint has raised an abort during this call.
    #[must_use]
    pub fn fired(&self) -> bool {
        state() == BridgeState::Triggered
    }

    /// Whether this guard owns the arming (is not nested).
    #[must_use]
    pub const fn is_outermost(&self) -> bool {
        self.outermost
    }
}

impl Drop for ArmedCall<'_> {
    fn drop(&mut self) {
        DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
        if self.outermost {
            self.lua.remove_hook();
            let previous = STATE.swap(IDLE, Ordering::SeqCst);
            debug!(pending = previous == PENDING, "interrupt bridge disarmed");
        }
    }
}
