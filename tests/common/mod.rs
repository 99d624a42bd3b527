#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::session::{Lox, RunStatus};

/// An in-memory writer whose contents stay readable after the session that
/// owns one handle has taken the other.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("output is UTF-8")
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session wired to two buffers: (session, stdout, stderr).
pub fn session() -> (Lox, SharedBuffer, SharedBuffer) {
    let out = SharedBuffer::default();
    let err = SharedBuffer::default();
    let lox = Lox::with_writers(Box::new(out.clone()), Box::new(err.clone()));

    (lox, out, err)
}

/// Run a whole program and return (status, stdout, stderr).
pub fn run(source: &str) -> (RunStatus, String, String) {
    let (mut lox, out, err) = session();
    let status = lox.run(source);

    (status, out.contents(), err.contents())
}

/// Run a program expected to succeed and return its stdout.
pub fn output_of(source: &str) -> String {
    let (status, out, err) = run(source);
    assert_eq!(status, RunStatus::Ok, "unexpected failure: {}", err);

    out
}
