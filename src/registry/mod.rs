mod error;
mod source_tree;

use std::{
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
};

use prost::Message;
use prost_reflect::{DescriptorPool, FileDescriptor, MessageDescriptor};
use prost_types::{FileDescriptorProto, FileDescriptorSet};
use protox::Compiler;
use tracing::debug;

pub use self::error::ImportError;

use self::source_tree::{normalize_name, SourceTree};

/// A collection of message types imported from `.proto` files found through a set of path
/// mappings.
///
/// A registry is safe to share between threads. Every mutation replaces its state as a whole,
/// so a failed import leaves the registry unchanged.
#[derive(Debug, Default)]
pub struct Registry {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    source_tree: SourceTree,
    pool: DescriptorPool,
}

impl Registry {
    /// Creates a new, empty registry with no path mappings.
    pub fn new() -> Self {
        Registry::default()
    }

    /// Makes the files under `disk_path` available as `virtual_path/...`.
    ///
    /// An empty `virtual_path` makes every file under `disk_path` available by its relative
    /// path. If `virtual_path` names a file, `disk_path` may be a file too. When several
    /// mappings provide a file with the same name, the most recently added wins.
    pub fn map_path(&self, virtual_path: &str, disk_path: impl AsRef<Path>) {
        let disk_path = disk_path.as_ref();
        debug!(virtual_path, disk_path = %disk_path.display(), "mapping proto path");
        self.lock()
            .source_tree
            .map_path(virtual_path, disk_path.to_owned());
    }

    /// Adds a directory to search for `.proto` files. Equivalent to `map_path("", path)`.
    pub fn add_proto_path(&self, path: impl AsRef<Path>) {
        self.map_path("", path)
    }

    /// Imports the file `file_name`, along with all of its transitive imports.
    ///
    /// Importing a file which has already been imported returns the existing descriptor.
    /// Imports of `google/protobuf/*.proto` that are not provided by a mapping resolve to the
    /// bundled well-known types.
    pub fn import(&self, file_name: &str) -> Result<FileDescriptor, ImportError> {
        let name = normalize_name(file_name);
        let mut state = self.lock();

        if let Some(file) = state.pool.get_file_by_name(&name) {
            debug!(file = %name, "file already imported");
            return Ok(file);
        }

        debug!(file = %name, "importing file");
        let mut compiler = Compiler::with_file_resolver(state.source_tree.clone());
        compiler.include_imports(true).include_source_info(false);
        if let Err(err) = compiler.open_file(&name) {
            debug!(file = %name, error = %err, "import failed");
            return Err(ImportError::from_protox(&name, &err, &state.source_tree));
        }

        let files = compiler.file_descriptor_set().file;
        let root_name = files.last().map(|file| file.name().to_owned());
        let pool = add_new_files(&state.pool, files)
            .map_err(|err| ImportError::from_descriptor(&name, &err))?;

        let file = pool
            .get_file_by_name(&name)
            .or_else(|| root_name.and_then(|root_name| pool.get_file_by_name(&root_name)));
        state.pool = pool;

        file.ok_or_else(|| ImportError::not_found(&name))
    }

    /// Adds the files in an encoded [`FileDescriptorSet`] to this registry. Files which have
    /// already been imported are skipped.
    pub fn add_file_descriptor_set(&self, bytes: &[u8]) -> Result<(), ImportError> {
        let set = FileDescriptorSet::decode(bytes).map_err(ImportError::from_decode)?;
        let mut state = self.lock();
        debug!(files = set.file.len(), "adding file descriptor set");
        state.pool = add_new_files(&state.pool, set.file).map_err(|err| {
            ImportError::from_descriptor(ImportError::DESCRIPTOR_SET_FILE, &err)
        })?;
        Ok(())
    }

    /// Gets a message type by its fully-qualified name. A leading `.` is accepted.
    pub fn find_message_type(&self, name: &str) -> Option<MessageDescriptor> {
        let name = name.strip_prefix('.').unwrap_or(name);
        self.lock().pool.get_message_by_name(name)
    }

    /// Gets a snapshot of all types imported so far.
    pub fn descriptor_pool(&self) -> DescriptorPool {
        self.lock().pool.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn add_new_files(
    pool: &DescriptorPool,
    files: Vec<FileDescriptorProto>,
) -> Result<DescriptorPool, prost_reflect::DescriptorError> {
    let mut pool = pool.clone();
    let new_files: Vec<_> = files
        .into_iter()
        .filter(|file| pool.get_file_by_name(file.name()).is_none())
        .collect();
    pool.add_file_descriptor_protos(new_files)?;
    Ok(pool)
}
