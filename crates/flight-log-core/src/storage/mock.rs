//! In-memory storage medium with fault injection, for tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use super::StorageMedium;

/// Medium call, as recorded by [`MockMedium::ops`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Mount,
    Exists,
    Create,
    Write(usize),
    Sync,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError(pub &'static str);

#[derive(Default)]
struct MockFileData {
    contents: Vec<u8>,
    durable_len: usize,
}

#[derive(Default)]
struct MockState {
    files: BTreeMap<String, MockFileData>,
    ops: Vec<Op>,
    open_files: usize,
    fail_mount: bool,
    fail_create: bool,
    fail_writes: bool,
    fail_syncs: bool,
}

/// Cloning shares the same backing state, so a test can keep a handle to a
/// medium it moved into the logger.
#[derive(Clone, Default)]
pub struct MockMedium {
    state: Rc<RefCell<MockState>>,
}

#[derive(Debug)]
pub struct MockFile {
    name: String,
}

impl MockMedium {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, name: &str, contents: &[u8]) {
        self.state.borrow_mut().files.insert(
            name.to_string(),
            MockFileData {
                contents: contents.to_vec(),
                durable_len: contents.len(),
            },
        );
    }

    /// Everything written to the file, synced or not.
    pub fn file(&self, name: &str) -> Option<Vec<u8>> {
        self.state
            .borrow()
            .files
            .get(name)
            .map(|f| f.contents.clone())
    }

    /// What would survive a power loss right now.
    pub fn durable(&self, name: &str) -> Option<Vec<u8>> {
        self.state
            .borrow()
            .files
            .get(name)
            .map(|f| f.contents[..f.durable_len].to_vec())
    }

    pub fn file_count(&self) -> usize {
        self.state.borrow().files.len()
    }

    pub fn open_files(&self) -> usize {
        self.state.borrow().open_files
    }

    pub fn ops(&self) -> Vec<Op> {
        self.state.borrow().ops.clone()
    }

    pub fn fail_mount(&self) {
        self.state.borrow_mut().fail_mount = true;
    }

    pub fn fail_create(&self) {
        self.state.borrow_mut().fail_create = true;
    }

    pub fn fail_writes(&self) {
        self.state.borrow_mut().fail_writes = true;
    }

    pub fn fail_syncs(&self) {
        self.state.borrow_mut().fail_syncs = true;
    }
}

impl StorageMedium for MockMedium {
    type File = MockFile;
    type Error = MockError;

    fn mount(&mut self) -> Result<(), MockError> {
        let mut state = self.state.borrow_mut();
        state.ops.push(Op::Mount);
        if state.fail_mount {
            return Err(MockError("no card"));
        }
        Ok(())
    }

    fn exists(&mut self, name: &str) -> Result<bool, MockError> {
        let mut state = self.state.borrow_mut();
        state.ops.push(Op::Exists);
        Ok(state.files.contains_key(name))
    }

    fn create(&mut self, name: &str) -> Result<MockFile, MockError> {
        let mut state = self.state.borrow_mut();
        state.ops.push(Op::Create);
        if state.fail_create || state.files.contains_key(name) {
            return Err(MockError("create refused"));
        }
        state.files.insert(name.to_string(), MockFileData::default());
        state.open_files += 1;
        Ok(MockFile {
            name: name.to_string(),
        })
    }

    fn write(&mut self, file: &mut MockFile, bytes: &[u8]) -> Result<(), MockError> {
        let mut state = self.state.borrow_mut();
        state.ops.push(Op::Write(bytes.len()));
        if state.fail_writes {
            return Err(MockError("write refused"));
        }
        let data = state
            .files
            .get_mut(&file.name)
            .ok_or(MockError("file vanished"))?;
        data.contents.extend_from_slice(bytes);
        Ok(())
    }

    fn sync(&mut self, file: &mut MockFile) -> Result<(), MockError> {
        let mut state = self.state.borrow_mut();
        state.ops.push(Op::Sync);
        if state.fail_syncs {
            return Err(MockError("sync refused"));
        }
        let data = state
            .files
            .get_mut(&file.name)
            .ok_or(MockError("file vanished"))?;
        data.durable_len = data.contents.len();
        Ok(())
    }

    fn close(&mut self, _file: MockFile) -> Result<(), MockError> {
        let mut state = self.state.borrow_mut();
        state.ops.push(Op::Close);
        state.open_files -= 1;
        Ok(())
    }
}
