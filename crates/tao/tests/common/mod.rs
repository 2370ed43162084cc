//! Shared helpers for the integration suites
#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use tao::{Error, Program, Value};

/// A `Write` sink into a shared buffer.
#[derive(Clone)]
pub struct SharedBuf(pub Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn new() -> Self {
        SharedBuf(Arc::new(Mutex::new(Vec::new())))
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl std::io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Load `src`, call `main`, and return captured stdout.
pub fn run(src: &str) -> String {
    let (stdout, _stderr) = run_capturing(src).expect("program failed");
    stdout
}

/// Load `src`, call `main`, and return (stdout, stderr).
pub fn run_capturing(src: &str) -> Result<(String, String), Error> {
    let mut program = Program::new();
    let out = SharedBuf::new();
    let err = SharedBuf::new();
    program.set_stdout(Box::new(out.clone()));
    program.set_stderr(Box::new(err.clone()));
    program.load(src)?;
    program.call("main", &[])?;
    Ok((out.contents(), err.contents()))
}

/// Load `src` and call `main`, expecting an error from either phase.
pub fn run_err(src: &str) -> Error {
    let mut program = Program::new();
    program.set_stdout(Box::new(SharedBuf::new()));
    program.set_stderr(Box::new(SharedBuf::new()));
    if let Err(err) = program.load(src) {
        return err;
    }
    match program.call("main", &[]) {
        Err(err) => err,
        Ok(value) => panic!("expected an error, got {}", value),
    }
}

/// Call a loaded function with arguments and return its value.
#[allow(dead_code)]
pub fn call(src: &str, name: &str, args: &[Value]) -> Result<Value, Error> {
    let mut program = Program::new();
    program.set_stdout(Box::new(SharedBuf::new()));
    program.load(src)?;
    program.call(name, args)
}
