//! Type registry.
//!
//! Maps oids and type names to shared [`TypeDescriptor`]s. Built-in scalar,
//! json and their array types are always present, composite and other array
//! types must be registered, either by hand or through a [`Catalog`].
use std::{
    borrow::Cow,
    collections::HashMap,
    fmt,
    hash::BuildHasher,
    sync::{Arc, LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{
    Config,
    cell::Cell,
    common::{ByteStr, trace},
    decode::Decode,
    descriptor::{Field, TypeDescriptor, TypeKind},
    error::Result,
    postgres::{BUILTINS, BuiltinKind, Oid, UNKNOWN, oid},
    value::Value,
};

/// Type lookup and decode dispatch.
///
/// ```
/// use pgcell::{Cell, Registry, Value};
///
/// let registry = Registry::new();
/// registry.register_composite("grade_distrib", 16400, [("grade", "bpchar"), ("distrib", "float8")]).unwrap();
///
/// let value = registry.decode(&Cell::text(16400, "(\"A\", 0.25)")).unwrap();
/// let record = value.as_record().unwrap();
/// assert_eq!(record.get("distrib"), Some(&Value::Float(0.25)));
/// ```
pub struct Registry {
    config: Config,
    types: RwLock<Types>,
}

#[derive(Default)]
struct Types {
    by_oid: HashMap<Oid, Arc<TypeDescriptor>>,
    by_name: HashMap<ByteStr, Arc<TypeDescriptor>>,
}

/// Type identifier used for lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Oid(Oid),
    Name(ByteStr),
}

/// An error when type is not registered.
pub struct UnknownType {
    ty: TypeRef,
}

/// An error returned by a [`Catalog`].
pub struct CatalogError {
    reason: Cow<'static,str>,
}

impl Registry {
    /// Create registry with built-in types and default [`Config`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create registry with built-in types.
    pub fn with_config(config: Config) -> Self {
        let mut types = Types::default();
        types.builtins();
        Self { config, types: RwLock::new(types) }
    }

    /// Process wide registry, configured from environment variables.
    ///
    /// See [`Config::from_env`].
    pub fn global() -> &'static Registry {
        static GLOBAL: LazyLock<Registry> = LazyLock::new(||Registry::with_config(Config::from_env()));
        &GLOBAL
    }

    /// Returns decoding configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn read(&self) -> RwLockReadGuard<'_, Types> {
        self.types.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Types> {
        self.types.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register type descriptor.
    ///
    /// Previous entry with the same oid or name is replaced, descriptors
    /// already handed out are not affected.
    pub fn register(&self, desc: TypeDescriptor) -> Arc<TypeDescriptor> {
        let desc = Arc::new(desc);
        trace!("register type {:?} with oid {}", desc.name(), desc.oid());
        self.write().insert(desc.clone());
        desc
    }

    /// Lookup type by oid or name.
    pub fn lookup(&self, ty: impl Into<TypeRef>) -> Result<Arc<TypeDescriptor>, UnknownType> {
        let ty = ty.into();
        let types = self.read();
        let found = match &ty {
            TypeRef::Oid(oid) => types.by_oid.get(oid),
            TypeRef::Name(name) => types.by_name.get(name),
        };
        found.cloned().ok_or(UnknownType { ty })
    }

    /// Register composite type, field types must be resolvable.
    pub fn register_composite<'a, T: Into<TypeRef>>(
        &self,
        name: &str,
        oid: Oid,
        fields: impl IntoIterator<Item = (&'a str, T)>,
    ) -> Result<Arc<TypeDescriptor>, UnknownType> {
        let fields = fields
            .into_iter()
            .map(|(field, ty)|Ok(Field::new(ByteStr::copy_from_str(field), self.lookup(ty)?)))
            .collect::<Result<Vec<_>, UnknownType>>()?;
        Ok(self.register(TypeDescriptor::composite(oid, ByteStr::copy_from_str(name), fields)))
    }

    /// Register array type, element type must be resolvable.
    pub fn register_array(
        &self,
        name: &str,
        oid: Oid,
        element: impl Into<TypeRef>,
    ) -> Result<Arc<TypeDescriptor>, UnknownType> {
        let element = self.lookup(element)?;
        let delimiter = delimiter_of(&element);
        Ok(self.register(TypeDescriptor::array_delimited(oid, ByteStr::copy_from_str(name), element, delimiter)))
    }

    /// Lookup type by name, otherwise describe it with `catalog` and register it.
    ///
    /// Field and element types are resolved the same way. A composite type is
    /// registered together with its array type.
    pub fn resolve<C: Catalog + ?Sized>(&self, name: &str, catalog: &C) -> Result<Arc<TypeDescriptor>> {
        self.resolve_inner(name, catalog, &mut Vec::new())
    }

    fn resolve_inner<C: Catalog + ?Sized>(
        &self,
        name: &str,
        catalog: &C,
        visiting: &mut Vec<String>,
    ) -> Result<Arc<TypeDescriptor>> {
        if let Ok(ok) = self.lookup(name) {
            return Ok(ok);
        }
        if visiting.iter().any(|e|e == name) {
            return Err(CatalogError::new(format!("type {name:?} contains itself")).into());
        }

        trace!("resolve type {name:?} from catalog");
        let entry = catalog.describe(name)?;
        visiting.push(name.to_owned());

        let desc = match entry.shape {
            CatalogShape::Composite(fields) => {
                let mut resolved = Vec::with_capacity(fields.len());
                for (field, ty) in fields {
                    resolved.push(Field::new(field, self.resolve_inner(&ty, catalog, visiting)?));
                }
                let desc = self.register(TypeDescriptor::composite(entry.oid, entry.name.clone(), resolved));
                if entry.array_oid != 0 {
                    let array = TypeDescriptor::array(entry.array_oid, format!("_{}", entry.name), desc.clone());
                    self.register(array);
                }
                desc
            }
            CatalogShape::Array { element, delimiter } => {
                let element = self.resolve_inner(&element, catalog, visiting)?;
                self.register(TypeDescriptor::array_delimited(entry.oid, entry.name, element, delimiter))
            }
        };

        visiting.pop();

        if desc.name() != name {
            self.write().alias(name, desc.clone());
        }

        Ok(desc)
    }

    /// Decode a cell using its registered type.
    pub fn decode(&self, cell: &Cell) -> Result<Value> {
        let Some(raw) = cell.value() else {
            return Ok(Value::Null);
        };
        let ty = self.lookup(cell.oid())?;
        Ok(ty.decode(cell.format(), raw.clone(), &self.config)?)
    }

    /// Decode a cell and convert it using [`Decode`] implementation.
    pub fn decode_as<D: Decode>(&self, cell: &Cell) -> Result<D> {
        Ok(D::decode(self.decode(cell)?)?)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types = self.read();
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("types", &types.by_oid.len())
            .finish()
    }
}

fn delimiter_of(element: &TypeDescriptor) -> u8 {
    match element.oid() {
        oid::BOX => b';',
        _ => b',',
    }
}

impl Types {
    fn builtins(&mut self) {
        for b in BUILTINS.iter().chain([&UNKNOWN]) {
            let desc = Arc::new(match b.kind {
                BuiltinKind::Scalar(kind) => TypeDescriptor::scalar(b.oid, b.name, kind),
                BuiltinKind::Document(kind) => TypeDescriptor::document(b.oid, b.name, kind),
            });

            for alias in b.aliases {
                self.alias(alias, desc.clone());
            }

            if b.array != 0 {
                let delimiter = delimiter_of(&desc);
                let array = TypeDescriptor::array_delimited(b.array, format!("_{}", b.name), desc.clone(), delimiter);
                let array = Arc::new(array);
                for alias in b.aliases {
                    self.alias(&format!("{alias}[]"), array.clone());
                }
                self.insert(array);
            }

            self.insert(desc);
        }
    }

    fn insert(&mut self, desc: Arc<TypeDescriptor>) {
        if desc.oid() != 0 {
            self.by_oid.insert(desc.oid(), desc.clone());
        }
        if let TypeKind::Array(array) = desc.kind() {
            self.alias(&format!("{}[]", array.element().name()), desc.clone());
        }
        self.alias(desc.name(), desc.clone());
    }

    fn alias(&mut self, name: &str, desc: Arc<TypeDescriptor>) {
        self.by_name.insert(ByteStr::copy_from_str(name), desc);
    }
}

// ===== TypeRef =====

impl From<Oid> for TypeRef {
    fn from(value: Oid) -> Self {
        Self::Oid(value)
    }
}

impl From<&str> for TypeRef {
    fn from(value: &str) -> Self {
        Self::Name(ByteStr::copy_from_str(value))
    }
}

impl From<String> for TypeRef {
    fn from(value: String) -> Self {
        Self::Name(value.into())
    }
}

impl From<ByteStr> for TypeRef {
    fn from(value: ByteStr) -> Self {
        Self::Name(value)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Oid(oid) => write!(f, "oid {oid}"),
            Self::Name(name) => write!(f, "{name:?}"),
        }
    }
}

// ===== Catalog =====

/// Source of type metadata, usually backed by `pg_type` and `pg_attribute`.
pub trait Catalog {
    /// Describe type by name.
    fn describe(&self, name: &str) -> Result<CatalogEntry, CatalogError>;
}

/// Type description returned by [`Catalog`].
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub oid: Oid,
    pub name: String,
    pub shape: CatalogShape,
    /// Oid of the array type of this type, zero if none.
    pub array_oid: Oid,
}

/// Shape of a [`CatalogEntry`].
#[derive(Debug, Clone)]
pub enum CatalogShape {
    /// Ordered `(field name, type name)`.
    Composite(Vec<(String, String)>),
    Array {
        element: String,
        delimiter: u8,
    },
}

impl<S: BuildHasher> Catalog for HashMap<String, CatalogEntry, S> {
    fn describe(&self, name: &str) -> Result<CatalogEntry, CatalogError> {
        match self.get(name) {
            Some(entry) => Ok(entry.clone()),
            None => Err(CatalogError::new(format!("type {name:?} does not exist"))),
        }
    }
}

// ===== Errors =====

impl UnknownType {
    /// Returns the requested type.
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }
}

impl std::error::Error for UnknownType { }

impl fmt::Display for UnknownType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown type: {}", self.ty)
    }
}

impl fmt::Debug for UnknownType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

impl CatalogError {
    /// Create new catalog error.
    pub fn new(reason: impl Into<Cow<'static,str>>) -> Self {
        Self { reason: reason.into() }
    }
}

impl std::error::Error for CatalogError { }

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            return f.write_str(&self.reason)
        }
        write!(f, "failed to describe type: {}", self.reason)
    }
}

impl fmt::Debug for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        ErrorKind, Record,
        decode::{DecodeError, Limit},
        descriptor::ScalarKind,
        document::{Document, Object},
    };

    fn grade_distrib(registry: &Registry) -> Arc<TypeDescriptor> {
        registry
            .register_composite("grade_distrib", 16400, [("grade", "bpchar"), ("distrib", "float8")])
            .unwrap()
    }

    fn record(grade: &'static str, distrib: f64) -> Value {
        Value::Record(Record::from_pairs([
            ("grade", Value::Text(grade.into())),
            ("distrib", Value::Float(distrib)),
        ]))
    }

    #[test]
    fn composite_cell() {
        let registry = Registry::new();
        grade_distrib(&registry);
        let value = registry.decode(&Cell::text(16400, "(\"A\", 0.25)")).unwrap();
        assert_eq!(value, record("A", 0.25));
    }

    #[test]
    fn builtin_array_cell() {
        let registry = Registry::new();
        let value = registry.decode_as::<Vec<Vec<i32>>>(&Cell::text(oid::INT4_ARRAY, "{{1,2,3},{4,5,6},{7,8,9}}"));
        assert_eq!(value.unwrap(), [[1, 2, 3], [4, 5, 6], [7, 8, 9]]);
    }

    #[test]
    fn composite_array_cell() {
        let registry = Registry::new();
        grade_distrib(&registry);
        registry.register_array("_grade_distrib", 16401, 16400u32).unwrap();

        let cell = Cell::text(16401, r#"{"(A,0.1)","(B,0.2)","(C,0.3)","(D,0.4)"}"#);
        let value = registry.decode(&cell).unwrap();
        assert_eq!(
            value,
            Value::Array(vec![record("A", 0.1), record("B", 0.2), record("C", 0.3), record("D", 0.4)])
        );
        assert!(registry.lookup("grade_distrib[]").is_ok());
    }

    #[test]
    fn json_cells() {
        let registry = Registry::new();
        let expect = Value::Document(Document::Object(Object::from_iter([("foo", Document::Float(3.14))])));

        let json = registry.decode(&Cell::text(oid::JSON, r#"{"foo":"bar","foo":3.14}"#)).unwrap();
        assert_eq!(json, expect);

        let jsonb = registry.decode(&Cell::binary(oid::JSONB, &b"\x01{\"foo\":\"bar\",\"foo\":3.14}"[..])).unwrap();
        assert_eq!(jsonb, expect);

        let jsonb = registry.decode(&Cell::text(oid::JSONB, r#"{"a": false, "b": null, "c": {}}"#)).unwrap();
        let doc = jsonb.as_document().unwrap();
        assert_eq!(doc.get("a"), Some(&Document::Bool(false)));
        assert_eq!(doc.get("b"), Some(&Document::Null));
        assert_eq!(doc.get("c").and_then(Document::as_object).map(Object::len), Some(0));
    }

    const FRUIT: &str = r#"{
        "foo": "bar",
        "bar": 42,
        "baz": false,
        "quuix": null,
        "foo": 3.14,
        "fruit": "apple"
    }"#;

    #[test]
    fn multiline_json_with_duplicates() {
        let registry = Registry::new();
        let expect = Object::from_iter([
            ("baz", Document::Bool(false)),
            ("foo", Document::Float(3.14)),
            ("bar", Document::Int(42)),
            ("fruit", Document::String("apple".into())),
            ("quuix", Document::Null),
        ]);

        let mut jsonb = vec![1u8];
        jsonb.extend_from_slice(FRUIT.as_bytes());

        for cell in [
            Cell::text(oid::JSON, FRUIT),
            Cell::text(oid::JSONB, FRUIT),
            Cell::binary(oid::JSONB, jsonb),
        ] {
            let value = registry.decode(&cell).unwrap();
            let object = value.as_document().and_then(Document::as_object).unwrap();
            assert_eq!(object, &expect);
            assert_eq!(object.keys().collect::<Vec<_>>(), ["foo", "bar", "baz", "quuix", "fruit"]);
        }
    }

    #[test]
    fn null_cell() {
        let registry = Registry::new();
        assert_eq!(registry.decode(&Cell::null(16400)).unwrap(), Value::Null);
        assert_eq!(registry.decode_as::<Option<String>>(&Cell::null(oid::TEXT)).unwrap(), None);
    }

    #[test]
    fn unknown_types() {
        let registry = Registry::new();
        assert!(registry.lookup(99999u32).is_err());
        assert!(registry.lookup("inventory_item").is_err());
        assert!(registry.register_composite("x", 1, [("a", "nope")]).is_err());

        let err = registry.decode(&Cell::text(99999, "(1)")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnknownType(_)));
        assert_eq!(err.kind().to_string(), "unknown type: oid 99999");
    }

    #[test]
    fn builtin_names() {
        let registry = Registry::new();
        assert_eq!(registry.lookup("integer").unwrap().oid(), oid::INT4);
        assert_eq!(registry.lookup("double precision").unwrap().oid(), oid::FLOAT8);
        assert_eq!(registry.lookup("_int4").unwrap().oid(), oid::INT4_ARRAY);
        assert_eq!(registry.lookup("int4[]").unwrap().oid(), oid::INT4_ARRAY);
        assert_eq!(registry.lookup("integer[]").unwrap().oid(), oid::INT4_ARRAY);
        assert_eq!(registry.lookup(oid::UNKNOWN).unwrap().name(), "unknown");

        let boxes = registry.lookup(oid::BOX_ARRAY).unwrap();
        let TypeKind::Array(array) = boxes.kind() else { panic!("expected array") };
        assert_eq!(array.delimiter(), b';');
    }

    #[test]
    fn builtin_scalars_resolve() {
        let registry = Registry::new();
        let cells = [
            (oid::INET, "192.168.0.1/24"),
            (oid::CIDR, "10.0.0.0/8"),
            (oid::MACADDR, "08:00:2b:01:02:03"),
            (oid::TIMETZ, "13:45:07+07"),
            (oid::XML, "<a>b</a>"),
            (oid::MONEY, "$1,000.00"),
            (oid::BIT, "101"),
            (oid::VARBIT, "10"),
            (oid::INT4RANGE, "[1,10)"),
            (oid::TSTZRANGE, "empty"),
            (oid::JSONPATH, "$.a[*]"),
            (oid::TSVECTOR, "'a' 'b'"),
            (oid::PG_LSN, "16/B374D848"),
            (oid::REGCLASS, "pg_class"),
        ];
        for (ty, text) in cells {
            let value = registry.decode(&Cell::text(ty, text)).unwrap();
            assert_eq!(value, Value::Text(ByteStr::from_static(text)), "{ty}");
        }

        let ranges = registry.decode(&Cell::text(oid::INT4RANGE_ARRAY, r#"{"[1,3)",empty}"#)).unwrap();
        assert_eq!(ranges, Value::Array(vec![Value::Text("[1,3)".into()), Value::Text("empty".into())]));

        assert_eq!(registry.lookup("inet").unwrap().oid(), oid::INET);
        assert_eq!(registry.lookup("time with time zone").unwrap().oid(), oid::TIMETZ);
        assert_eq!(registry.lookup("bit varying[]").unwrap().oid(), oid::VARBIT_ARRAY);
        assert_eq!(registry.lookup("_money").unwrap().oid(), oid::MONEY_ARRAY);
        assert_eq!(registry.lookup("int8multirange").unwrap().oid(), oid::INT8MULTIRANGE);

        let err = registry.decode(&Cell::binary(oid::INET, vec![2u8, 32, 0, 4, 10, 0, 0, 1])).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Decode(DecodeError::MalformedLiteral { .. })));
    }

    #[test]
    fn reregister_keeps_handed_out() {
        let registry = Registry::new();
        let int4 = registry.lookup("int4").unwrap();
        let old = registry.register(TypeDescriptor::composite(16500, "pair", [Field::new("a", int4)]));
        let text = registry.lookup("text").unwrap();
        registry.register(TypeDescriptor::composite(16500, "pair", [Field::new("a", text)]));

        let TypeKind::Composite(old) = old.kind() else { panic!("expected composite") };
        assert_eq!(old.fields()[0].ty().oid(), oid::INT4);

        let new = registry.lookup(16500u32).unwrap();
        let TypeKind::Composite(new) = new.kind() else { panic!("expected composite") };
        assert_eq!(new.fields()[0].ty().oid(), oid::TEXT);
    }

    fn catalog() -> HashMap<String, CatalogEntry> {
        let composite = |oid, name: &str, array_oid, fields: &[(&str, &str)]| {
            let fields = fields.iter().map(|(a, b)|(a.to_string(), b.to_string())).collect();
            (name.to_owned(), CatalogEntry { oid, name: name.to_owned(), shape: CatalogShape::Composite(fields), array_oid })
        };
        HashMap::from([
            composite(16600, "inventory_item", 16601, &[("name", "text"), ("supplier_id", "integer"), ("price", "numeric")]),
            composite(16610, "on_hand", 0, &[("item", "inventory_item"), ("count", "int4")]),
            composite(16620, "a", 0, &[("b", "b")]),
            composite(16630, "b", 0, &[("a", "a")]),
        ])
    }

    #[test]
    fn resolve_from_catalog() {
        let registry = Registry::new();
        let catalog = catalog();

        let on_hand = registry.resolve("on_hand", &catalog).unwrap();
        assert_eq!(on_hand.oid(), 16610);
        assert!(registry.lookup("inventory_item").is_ok());
        assert!(registry.lookup(16601u32).is_ok());
        assert!(registry.lookup("_inventory_item").is_ok());

        let value = registry.decode(&Cell::text(16610, r#"("(""fuzzy dice"",42,1.99)",1000)"#)).unwrap();
        let on_hand = value.as_record().unwrap();
        let item = on_hand.get("item").and_then(Value::as_record).unwrap();
        assert_eq!(item.get("name"), Some(&Value::Text("fuzzy dice".into())));
        assert_eq!(item.get("supplier_id"), Some(&Value::Int(42)));
        assert_eq!(item.get("price"), Some(&Value::Float(1.99)));
        assert_eq!(on_hand.get("count"), Some(&Value::Int(1000)));
    }

    #[test]
    fn resolve_errors() {
        let registry = Registry::new();
        let catalog = catalog();

        let err = registry.resolve("missing", &catalog).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Catalog(_)));

        let err = registry.resolve("a", &catalog).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Catalog(_)));
        assert!(registry.lookup("a").is_err());
    }

    #[test]
    fn payload_limit() {
        let registry = Registry::with_config(Config::default().max_payload(4));
        let err = registry.decode(&Cell::text(oid::TEXT, "hello")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Decode(DecodeError::Limit { limit: Limit::Payload(4), .. })));
        assert!(registry.decode(&Cell::text(oid::TEXT, "hell")).is_ok());
    }

    #[test]
    fn global_registry() {
        let int8 = Registry::global().lookup(oid::INT8).unwrap();
        assert!(matches!(int8.kind(), TypeKind::Scalar(ScalarKind::Int)));
    }

    #[test]
    fn concurrent_decode() {
        fn shared<T: Send + Sync>() {}
        shared::<Registry>();
        shared::<Arc<TypeDescriptor>>();

        let registry = Registry::new();
        grade_distrib(&registry);
        registry.register_array("_grade_distrib", 16401, 16400u32).unwrap();

        let composite = Cell::text(16400, "(\"A\", 0.25)");
        let array = Cell::text(16401, r#"{"(A,0.1)","(B,0.2)","(C,0.3)","(D,0.4)"}"#);
        let expect = (
            registry.decode(&composite).unwrap(),
            registry.decode(&array).unwrap(),
        );

        let results = std::thread::scope(|scope| {
            let handles = (0..8)
                .map(|_| scope.spawn(|| {
                    (0..50)
                        .map(|_|(registry.decode(&composite).unwrap(), registry.decode(&array).unwrap()))
                        .collect::<Vec<_>>()
                }))
                .collect::<Vec<_>>();
            handles.into_iter().flat_map(|e|e.join().unwrap()).collect::<Vec<_>>()
        });

        assert_eq!(results.len(), 400);
        assert!(results.iter().all(|e|e == &expect));
        assert_eq!(expect.0, record("A", 0.25));
    }
}
