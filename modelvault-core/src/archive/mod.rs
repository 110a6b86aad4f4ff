/*
    Archive subsystem - object graphs to format-neutral value trees

    Reserved keys (the whole `$` prefix is reserved and rejected in user data):
    - `$class`   wire name of an object node
    - `$payload` fields of an object node
    - `$alias`   back-reference to an earlier object, by first-encounter index
    - `$version` / `$root` archive envelope
*/

mod alias;
pub mod archiver;
pub mod errors;
pub mod node;
pub mod registry;
pub mod value;

pub use archiver::{
    declared_root_class, envelope_root, Archiver, DecodeOptions, ARCHIVE_FORMAT_VERSION,
    MAX_NESTING_DEPTH,
};
pub use errors::{ArchiveError, ArchiveResult};
pub use node::{AnyObject, Archivable, KeyedDecoder, KeyedEncoder, Node, ObjectRef};
pub use registry::{ClassInfo, ClassRegistry};
pub use value::PrimitiveValue;

pub const RESERVED_PREFIX: char = '$';
pub const CLASS_KEY: &str = "$class";
pub const PAYLOAD_KEY: &str = "$payload";
pub const ALIAS_KEY: &str = "$alias";
pub const VERSION_KEY: &str = "$version";
pub const ROOT_KEY: &str = "$root";
