//! Type descriptors, the per-parse allow-list, and the anonymous record
//! shape cache.
//!
//! Member and type lookup is backed by hand-written descriptor tables built
//! once per registry, not by any runtime scan. A registry starts with the
//! always-visible primitive names; callers *declare* additional object and
//! enum descriptors into the catalogue and *allow* the ones a given parse
//! may reach. A declared-but-not-allowed name is rejected as a disallowed
//! type, which is the sandboxing boundary.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, OnceLock};

use crate::types::{FloatTy, IntTy, Ty};

/// A readable property on a registered object type.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub ty: Ty,
}

/// Describes an object type reachable from expressions.
///
/// Instances are represented at runtime by [`crate::value::Value::Object`]
/// with a field map; the descriptor gives those fields static types.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    pub name: String,
    pub properties: Vec<PropertyDescriptor>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        TypeDescriptor {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, ty: Ty) -> Self {
        self.properties.push(PropertyDescriptor {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }
}

// Descriptor identity is by name; a registry never holds two descriptors
// under the same name.
impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Describes an enum type: named members over an underlying integral type.
#[derive(Debug, Clone)]
pub struct EnumDescriptor {
    pub name: String,
    pub underlying: IntTy,
    pub members: Vec<(String, i64)>,
}

impl EnumDescriptor {
    pub fn new(name: impl Into<String>, underlying: IntTy) -> Self {
        EnumDescriptor {
            name: name.into(),
            underlying,
            members: Vec::new(),
        }
    }

    pub fn with_member(mut self, name: impl Into<String>, value: i64) -> Self {
        self.members.push((name.into(), value));
        self
    }

    pub fn member(&self, name: &str) -> Option<i64> {
        self.members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn member_name(&self, value: i64) -> Option<&str> {
        self.members
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(n, _)| n.as_str())
    }
}

impl PartialEq for EnumDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// What a name in the registry stands for.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    /// A primitive name standing directly for a static type.
    Value(Ty),
    Object(Arc<TypeDescriptor>),
    Enum(Arc<EnumDescriptor>),
}

impl TypeDef {
    pub fn as_ty(&self) -> Ty {
        match self {
            TypeDef::Value(ty) => ty.clone(),
            TypeDef::Object(d) => Ty::Object(d.clone()),
            TypeDef::Enum(e) => Ty::Enum(e.clone()),
        }
    }
}

/// Outcome of resolving a type name for a parse.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeResolution {
    Allowed(TypeDef),
    /// In the catalogue but not on this parse's allow-list.
    Declared,
    Unknown,
}

/// The per-parse set of reachable named types.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    catalogue: HashMap<String, TypeDef>,
    allowed: HashSet<String>,
}

const PRIMITIVES: &[(&str, Ty)] = &[
    ("Boolean", Ty::Bool),
    ("Char", Ty::Char),
    ("String", Ty::Str),
    ("SByte", Ty::Int(IntTy::I8)),
    ("Byte", Ty::Int(IntTy::U8)),
    ("Int16", Ty::Int(IntTy::I16)),
    ("UInt16", Ty::Int(IntTy::U16)),
    ("Int32", Ty::Int(IntTy::I32)),
    ("UInt32", Ty::Int(IntTy::U32)),
    ("Int64", Ty::Int(IntTy::I64)),
    ("UInt64", Ty::Int(IntTy::U64)),
    ("Single", Ty::Float(FloatTy::F32)),
    ("Double", Ty::Float(FloatTy::F64)),
    ("Decimal", Ty::Decimal),
    ("Object", Ty::Dynamic),
];

impl TypeRegistry {
    /// A registry with only the always-visible primitive names, each also
    /// reachable under its `System.`-qualified spelling.
    pub fn new() -> Self {
        let mut catalogue = HashMap::new();
        let mut allowed = HashSet::new();
        for (name, ty) in PRIMITIVES {
            catalogue.insert((*name).to_string(), TypeDef::Value(ty.clone()));
            catalogue.insert(format!("System.{}", name), TypeDef::Value(ty.clone()));
            allowed.insert((*name).to_string());
            allowed.insert(format!("System.{}", name));
        }
        TypeRegistry { catalogue, allowed }
    }

    /// Adds an object descriptor to the catalogue without allowing it.
    pub fn declare_object(&mut self, descriptor: TypeDescriptor) {
        self.catalogue.insert(
            descriptor.name.clone(),
            TypeDef::Object(Arc::new(descriptor)),
        );
    }

    /// Adds an enum descriptor to the catalogue without allowing it.
    pub fn declare_enum(&mut self, descriptor: EnumDescriptor) {
        self.catalogue
            .insert(descriptor.name.clone(), TypeDef::Enum(Arc::new(descriptor)));
    }

    /// Puts a previously declared name on the allow-list.
    pub fn allow(&mut self, name: &str) {
        self.allowed.insert(name.to_string());
    }

    /// Declares and allows an object type.
    pub fn with_object(mut self, descriptor: TypeDescriptor) -> Self {
        let name = descriptor.name.clone();
        self.declare_object(descriptor);
        self.allow(&name);
        self
    }

    /// Declares and allows an enum type.
    pub fn with_enum(mut self, descriptor: EnumDescriptor) -> Self {
        let name = descriptor.name.clone();
        self.declare_enum(descriptor);
        self.allow(&name);
        self
    }

    /// Returns the descriptor handle for an allowed object type name.
    pub fn object(&self, name: &str) -> Option<Arc<TypeDescriptor>> {
        match self.resolve(name) {
            TypeResolution::Allowed(TypeDef::Object(d)) => Some(d),
            _ => None,
        }
    }

    /// Returns the descriptor handle for an allowed enum type name.
    pub fn enumeration(&self, name: &str) -> Option<Arc<EnumDescriptor>> {
        match self.resolve(name) {
            TypeResolution::Allowed(TypeDef::Enum(e)) => Some(e),
            _ => None,
        }
    }

    pub fn resolve(&self, name: &str) -> TypeResolution {
        match self.catalogue.get(name) {
            Some(def) if self.allowed.contains(name) => TypeResolution::Allowed(def.clone()),
            Some(_) => TypeResolution::Declared,
            None => TypeResolution::Unknown,
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        TypeRegistry::new()
    }
}

/// Built-in `String` instance methods, dispatched by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrMethod {
    Contains,
    StartsWith,
    EndsWith,
    ToUpper,
    ToLower,
    Trim,
    Substring1,
    Substring2,
    IndexOf,
    Replace,
    /// Regex match against the receiver.
    Matches,
}

/// A callable member signature with its built-in implementation tag.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    pub name: &'static str,
    pub params: Vec<Ty>,
    pub ret: Ty,
    pub builtin: StrMethod,
}

/// The `String` member method table.
pub fn string_methods() -> &'static [Arc<MethodDescriptor>] {
    static METHODS: OnceLock<Vec<Arc<MethodDescriptor>>> = OnceLock::new();
    METHODS.get_or_init(|| {
        let m = |name, params, ret, builtin| {
            Arc::new(MethodDescriptor {
                name,
                params,
                ret,
                builtin,
            })
        };
        vec![
            m("Contains", vec![Ty::Str], Ty::Bool, StrMethod::Contains),
            m("StartsWith", vec![Ty::Str], Ty::Bool, StrMethod::StartsWith),
            m("EndsWith", vec![Ty::Str], Ty::Bool, StrMethod::EndsWith),
            m("ToUpper", vec![], Ty::Str, StrMethod::ToUpper),
            m("ToLower", vec![], Ty::Str, StrMethod::ToLower),
            m("Trim", vec![], Ty::Str, StrMethod::Trim),
            m(
                "Substring",
                vec![Ty::Int(IntTy::I32)],
                Ty::Str,
                StrMethod::Substring1,
            ),
            m(
                "Substring",
                vec![Ty::Int(IntTy::I32), Ty::Int(IntTy::I32)],
                Ty::Str,
                StrMethod::Substring2,
            ),
            m(
                "IndexOf",
                vec![Ty::Str],
                Ty::Int(IntTy::I32),
                StrMethod::IndexOf,
            ),
            m(
                "Replace",
                vec![Ty::Str, Ty::Str],
                Ty::Str,
                StrMethod::Replace,
            ),
            m("Matches", vec![Ty::Str], Ty::Bool, StrMethod::Matches),
        ]
    })
}

/// The structural shape of an anonymous record: an ordered (name, type)
/// field list. Two shapes are equal iff their sequences are pairwise equal,
/// and equal shapes share one handle process-wide.
#[derive(Debug, Clone)]
pub struct RecordShape {
    pub id: usize,
    pub fields: Vec<(String, Ty)>,
}

impl RecordShape {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|(n, _)| n == name)
    }

    pub fn field_ty(&self, name: &str) -> Option<&Ty> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }
}

// The cache guarantees one shape per field sequence, so id equality is
// shape equality.
impl PartialEq for RecordShape {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

struct ShapeCache {
    shapes: HashMap<String, Arc<RecordShape>>,
    next_id: usize,
}

fn shape_cache() -> &'static Mutex<ShapeCache> {
    static CACHE: OnceLock<Mutex<ShapeCache>> = OnceLock::new();
    CACHE.get_or_init(|| {
        Mutex::new(ShapeCache {
            shapes: HashMap::new(),
            next_id: 0,
        })
    })
}

fn shape_key(fields: &[(String, Ty)]) -> String {
    let mut key = String::new();
    for (name, ty) in fields {
        key.push_str(name);
        key.push(':');
        key.push_str(&ty.name());
        key.push(';');
    }
    key
}

/// Returns the shared handle for the given ordered field list, creating it
/// on first use. Insert-if-absent under the cache lock; the cache grows
/// monotonically for the life of the process.
pub fn record_shape(fields: Vec<(String, Ty)>) -> Arc<RecordShape> {
    let key = shape_key(&fields);
    let mut cache = shape_cache().lock().expect("shape cache poisoned");
    if let Some(shape) = cache.shapes.get(&key) {
        return shape.clone();
    }
    let id = cache.next_id;
    cache.next_id += 1;
    let shape = Arc::new(RecordShape { id, fields });
    cache.shapes.insert(key, shape.clone());
    shape
}

/// Clears the shape cache. Intended for tests that assert shape-identity
/// behavior deterministically; ids keep increasing across resets.
pub fn reset_shape_cache() {
    let mut cache = shape_cache().lock().expect("shape cache poisoned");
    cache.shapes.clear();
}
