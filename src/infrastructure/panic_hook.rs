//! Process panic hook with quiet sections
//!
//! The default hook prints `thread '…' panicked at …` to stderr for every
//! panic, including the ones the pipeline catches and reports itself.
//! [`quiet`] marks the current thread so the hook only records the panic
//! location; panics outside a quiet section go to the previous hook.

use std::cell::{Cell, RefCell};
use std::panic;
use std::sync::Once;

static INSTALL: Once = Once::new();

thread_local! {
    static QUIET: Cell<bool> = const { Cell::new(false) };
    static LOCATION: RefCell<Option<String>> = const { RefCell::new(None) };
}

fn install() {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if QUIET.with(Cell::get) {
                let location = info.location().map(ToString::to_string);
                LOCATION.with(|l| *l.borrow_mut() = location);
            } else {
                previous(info);
            }
        }));
    });
}

/// Restores the previous quiet flag, also when `f` unwinds.
struct Reset(bool);

impl Drop for Reset {
    fn drop(&mut self) {
        QUIET.with(|q| q.set(self.0));
    }
}

/// Run `f` with panic reporting silenced on this thread.
///
/// `f` is expected to catch its own panics; read the location of the last
/// one with [`take_location`].
pub fn quiet<R>(f: impl FnOnce() -> R) -> R {
    install();
    LOCATION.with(|l| l.borrow_mut().take());
    let _reset = Reset(QUIET.with(|q| q.replace(true)));
    f()
}

/// Location (`file:line:col`) of the last panic raised in a quiet section.
pub fn take_location() -> Option<String> {
    LOCATION.with(|l| l.borrow_mut().take())
}
