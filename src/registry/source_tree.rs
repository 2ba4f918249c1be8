use std::{
    fs,
    path::{Path, PathBuf},
};

use protox::{
    file::{File, FileResolver, GoogleFileResolver},
    Error,
};

/// Maps virtual `.proto` file names onto directories or files on disk.
#[derive(Debug, Clone, Default)]
pub(crate) struct SourceTree {
    mappings: Vec<Mapping>,
}

#[derive(Debug, Clone)]
struct Mapping {
    virtual_path: String,
    disk_path: PathBuf,
}

impl SourceTree {
    pub(crate) fn map_path(&mut self, virtual_path: &str, disk_path: PathBuf) {
        self.mappings.push(Mapping {
            virtual_path: normalize_name(virtual_path).trim_end_matches('/').to_owned(),
            disk_path,
        });
    }

    /// Candidate disk locations for `name`, most recently mapped first.
    fn candidates<'a>(&'a self, name: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
        self.mappings
            .iter()
            .rev()
            .filter_map(move |mapping| mapping.apply(name))
    }

    pub(crate) fn read_source(&self, name: &str) -> Option<String> {
        self.candidates(name)
            .find_map(|path| fs::read_to_string(path).ok())
    }
}

impl Mapping {
    fn apply(&self, name: &str) -> Option<PathBuf> {
        if self.virtual_path.is_empty() {
            Some(self.disk_path.join(name))
        } else if name == self.virtual_path {
            Some(self.disk_path.clone())
        } else {
            name.strip_prefix(self.virtual_path.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .map(|rest| self.disk_path.join(rest))
        }
    }
}

impl FileResolver for SourceTree {
    fn resolve_path(&self, path: &Path) -> Option<String> {
        // Reverse mapping, so that disk paths passed to `import` get a stable virtual name.
        self.mappings.iter().rev().find_map(|mapping| {
            let rest = path.strip_prefix(&mapping.disk_path).ok()?;
            let rest = rest.to_str()?.replace('\\', "/");
            match (mapping.virtual_path.is_empty(), rest.is_empty()) {
                (true, false) => Some(rest),
                (true, true) => None,
                (false, true) => Some(mapping.virtual_path.clone()),
                (false, false) => Some(format!("{}/{}", mapping.virtual_path, rest)),
            }
        })
    }

    fn open_file(&self, name: &str) -> Result<File, Error> {
        for path in self.candidates(name) {
            match File::open(name, &path) {
                Ok(file) => return Ok(file),
                Err(err) if err.is_file_not_found() => continue,
                Err(err) => return Err(err),
            }
        }

        GoogleFileResolver::new().open_file(name)
    }
}

pub(crate) fn normalize_name(name: &str) -> String {
    let name = name.replace('\\', "/");
    let mut name = name.as_str();
    while let Some(rest) = name.strip_prefix("./") {
        name = rest;
    }
    name.to_owned()
}
