//! Standard library catalog
//!
//! Maps library names from configuration onto the Lua standard libraries the
//! embedded engine can open. `base` is opened with every state and cannot be
//! removed.

use mlua::{Lua, StdLib};
use std::fmt;
use tracing::{debug, warn};

/// A library name from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Library {
    Base,
    Debug,
    Io,
    Math,
    Os,
    Package,
    String,
    Table,
    Coroutine,
    Utf8,
    /// LuaFileSystem. Not bundled with the engine.
    Lfs,
}

impl Library {
    pub const ALL: [Library; 11] = [
        Library::Base,
        Library::Debug,
        Library::Io,
        Library::Math,
        Library::Os,
        Library::Package,
        Library::String,
        Library::Table,
        Library::Coroutine,
        Library::Utf8,
        Library::Lfs,
    ];

    /// Look up a catalog name. Names are case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lib| lib.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Library::Base => "base",
            Library::Debug => "debug",
            Library::Io => "io",
            Library::Math => "math",
            Library::Os => "os",
            Library::Package => "package",
            Library::String => "string",
            Library::Table => "table",
            Library::Coroutine => "coroutine",
            Library::Utf8 => "utf8",
            Library::Lfs => "lfs",
        }
    }

    /// Engine flag, or `None` for libraries with nothing to open
    fn std_lib(self) -> Option<StdLib> {
        match self {
            Library::Debug => Some(StdLib::DEBUG),
            Library::Io => Some(StdLib::IO),
            Library::Math => Some(StdLib::MATH),
            Library::Os => Some(StdLib::OS),
            Library::Package => Some(StdLib::PACKAGE),
            Library::String => Some(StdLib::STRING),
            Library::Table => Some(StdLib::TABLE),
            Library::Coroutine => Some(StdLib::COROUTINE),
            Library::Utf8 => Some(StdLib::UTF8),
            Library::Base | Library::Lfs => None,
        }
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve names to the set of engine libraries to open.
///
/// Unknown names are ignored. `lfs` is skipped with a warning.
pub(crate) fn resolve<S: AsRef<str>>(names: &[S]) -> StdLib {
    let mut libs = StdLib::NONE;

    for name in names {
        let name = name.as_ref();
        let Some(library) = Library::from_name(name) else {
            debug!(library = name, "ignoring unknown library name");
            continue;
        };

        match library {
            Library::Base => {}
            Library::Lfs => warn!("LuaFileSystem (lfs) is not bundled; skipping"),
            other => {
                if let Some(lib) = other.std_lib() {
                    libs = libs | lib;
                }
            }
        }
    }

    libs
}

/// Open the named libraries in `lua`
pub(crate) fn load<S: AsRef<str>>(lua: &Lua, names: &[S]) -> mlua::Result<()> {
    let libs = resolve(names);
    debug!(
        libraries = %names.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(","),
        "opening Lua libraries"
    );
    lua.load_std_libs(libs)
}
