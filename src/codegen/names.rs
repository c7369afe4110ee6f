//! Name Resolution Pass
//!
//! Maps shape names to the Rust names generated for them:
//! - type namespace: `T`, `TParameters`, `TProperties`, `TFields`
//! - value namespace: the snake-case prefix of `t_properties_*` and
//!   record-style `t_*` routines
//!
//! Generated names that collide with each other, with the runtime prelude
//! or with standard library types are reported, never disambiguated: a
//! silent rename would change the public surface of generated code.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::model::{ModelError, ShapeType, TypeModel, TypeName};

/// Rust keywords; identifiers equal to one get a trailing underscore
const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern", "false", "fn",
    "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return", "self", "Self",
    "static", "struct", "super", "trait", "true", "type", "unsafe", "use", "where", "while", "abstract", "become",
    "box", "do", "final", "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Standard library names generated types must not shadow
const STDLIB_NAMES: &[&str] = &[
    "String", "Vec", "Option", "Result", "Box", "Rc", "Arc", "HashMap", "HashSet", "BTreeMap", "BTreeSet",
    "RefCell", "Cell", "Mutex", "RwLock", "Debug", "Clone", "Default", "Copy", "Send", "Sync", "Some", "None",
    "Ok", "Err", "From", "Into", "Iterator", "PartialEq", "Eq", "Hash", "bool", "i8", "i16", "i32", "i64", "i128",
    "isize", "u8", "u16", "u32", "u64", "u128", "usize", "f32", "f64", "str", "char",
];

/// Names imported by `use {runtime}::prelude::*` in generated modules
const PRELUDE_NAMES: &[&str] = &[
    "Dataset", "Quad", "EqualsResult", "Unequal", "DecodeError", "DocumentError", "HashValue", "ShapeHasher",
    "LazyIdentifier", "FromDocument", "ToDocument", "FromRdfOptions", "MutableResource", "Resource",
    "ToRdfOptions", "SparqlOptions", "BlankNode", "Identifier", "Literal", "NamedNode", "Term", "FromTerm",
    "ToTerm", "DateTime", "NaiveDate", "Utc",
];

/// Prelude functions and modules in the value namespace
const PRELUDE_VALUES: &[&str] = &[
    "option_equals", "property", "sequence_equals", "strict_equals", "hash_sequence", "mint_blank", "mint_content_hash",
    "mint_random", "json", "sparql", "rdf", "xsd",
];

// =============================================================================
// Casing
// =============================================================================

/// Split on separators and lower-to-upper case changes. A run of capitals
/// stays one word ("HTTPServer" -> "HTTP", "Server").
fn words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c == ' ' || c == '.' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_ascii_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).map(|n| n.is_ascii_lowercase()).unwrap_or(false);
            if prev.is_ascii_lowercase() || prev.is_ascii_digit() || (prev.is_ascii_uppercase() && next_is_lower) {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Convert to PascalCase. Names without separators keep their casing
/// apart from the first letter.
pub fn to_pascal_case(s: &str) -> String {
    if !s.contains(['_', '-', ' ', '.']) {
        let mut chars = s.chars();
        return match chars.next() {
            None => String::new(),
            Some(first) => first.to_uppercase().chain(chars).collect(),
        };
    }
    words(s)
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}

/// Convert to snake_case
pub fn to_snake_case(s: &str) -> String {
    words(s)
        .iter()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Append `_` to identifiers that are keywords
pub fn escape_keyword(s: &str) -> String {
    if KEYWORDS.contains(&s) {
        format!("{}_", s)
    } else {
        s.to_string()
    }
}

/// Field and accessor name of a property
pub fn field_name(property: &str) -> String {
    escape_keyword(&to_snake_case(property))
}

// =============================================================================
// Name Resolver
// =============================================================================

/// Names generated for one shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNames {
    /// Struct or enum name
    pub rust_name: String,
    /// Constructor input of concrete objects
    pub parameters: String,
    /// Decoded property record of objects
    pub properties: String,
    /// Accessor trait of objects
    pub fields_trait: String,
    /// Prefix of generated free functions
    pub prefix: String,
}

impl TypeNames {
    fn new(shape_name: &str) -> Self {
        let rust_name = escape_keyword(&to_pascal_case(shape_name));
        Self {
            parameters: format!("{}Parameters", rust_name),
            properties: format!("{}Properties", rust_name),
            fields_trait: format!("{}Fields", rust_name),
            prefix: escape_keyword(&to_snake_case(shape_name)),
            rust_name,
        }
    }

    /// Type-namespace names this shape claims
    fn claimed_types(&self, shape: &ShapeType) -> Vec<&str> {
        match shape {
            ShapeType::Object(object) if object.is_abstract => vec![&self.properties, &self.fields_trait],
            ShapeType::Object(_) => vec![&self.rust_name, &self.parameters, &self.properties, &self.fields_trait],
            ShapeType::Union(_) => vec![&self.rust_name],
            ShapeType::Value(_) => Vec::new(),
        }
    }
}

/// Resolves shape names to generated Rust names
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    resolved: HashMap<TypeName, TypeNames>,
}

impl NameResolver {
    /// Resolve every object and union type. Returns the resolver and one
    /// error per type whose names collide.
    pub fn build(model: &TypeModel) -> (Self, Vec<ModelError>) {
        let reserved_types: HashSet<&str> = STDLIB_NAMES.iter().chain(PRELUDE_NAMES).copied().collect();
        let reserved_values: HashSet<&str> = PRELUDE_VALUES.iter().copied().collect();

        let mut resolver = Self::default();
        let mut errors = Vec::new();
        let mut type_owners: HashMap<String, TypeName> = HashMap::new();
        let mut prefix_owners: HashMap<String, TypeName> = HashMap::new();

        for shape in model.iter() {
            if matches!(shape, ShapeType::Value(_)) {
                continue;
            }
            let names = TypeNames::new(shape.name());
            let collision = |generated: &str, other: String| ModelError::TypeNameCollision {
                type_name: shape.name().to_string(),
                generated: generated.to_string(),
                other,
            };

            let mut error = None;
            for generated in names.claimed_types(shape) {
                if reserved_types.contains(generated) {
                    error = Some(collision(generated, "a standard or runtime name".to_string()));
                } else if let Some(owner) = type_owners.get(generated) {
                    error = Some(collision(generated, format!("a name generated for '{}'", owner)));
                }
                if error.is_some() {
                    break;
                }
            }
            if error.is_none() {
                if reserved_values.contains(names.prefix.as_str()) {
                    error = Some(collision(&names.prefix, "a runtime function".to_string()));
                } else if let Some(owner) = prefix_owners.get(&names.prefix) {
                    error = Some(collision(&names.prefix, format!("the function prefix of '{}'", owner)));
                }
            }

            // The first claimant keeps its names either way
            for generated in names.claimed_types(shape) {
                type_owners
                    .entry(generated.to_string())
                    .or_insert_with(|| shape.name().to_string());
            }
            prefix_owners
                .entry(names.prefix.clone())
                .or_insert_with(|| shape.name().to_string());

            match error {
                Some(error) => errors.push(error),
                None => {
                    debug!(shape = shape.name(), rust_name = %names.rust_name, prefix = %names.prefix, "resolved names");
                    resolver.resolved.insert(shape.name().to_string(), names);
                }
            }
        }

        (resolver, errors)
    }

    pub fn get(&self, shape_name: &str) -> Option<&TypeNames> {
        self.resolved.get(shape_name)
    }

    pub fn rust_name(&self, shape_name: &str) -> Option<&str> {
        self.get(shape_name).map(|names| names.rust_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::descriptor::parse_str;
    use crate::model::build_model;

    #[test]
    fn test_casing() {
        assert_eq!(to_pascal_case("person"), "Person");
        assert_eq!(to_pascal_case("PostalAddress"), "PostalAddress");
        assert_eq!(to_pascal_case("postal_address"), "PostalAddress");
        assert_eq!(to_snake_case("PostalAddress"), "postal_address");
        assert_eq!(to_snake_case("firstName"), "first_name");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("first-name"), "first_name");
        assert_eq!(to_snake_case("item2Label"), "item2_label");
    }

    #[test]
    fn test_keywords_escaped() {
        assert_eq!(field_name("type"), "type_");
        assert_eq!(field_name("match"), "match_");
        assert_eq!(field_name("label"), "label");
        assert_eq!(TypeNames::new("Self").rust_name, "Self_");
    }

    #[test]
    fn test_generated_names() {
        let names = TypeNames::new("Person");
        assert_eq!(names.parameters, "PersonParameters");
        assert_eq!(names.properties, "PersonProperties");
        assert_eq!(names.fields_trait, "PersonFields");
        assert_eq!(names.prefix, "person");
    }

    fn resolve(json: &str) -> (NameResolver, Vec<ModelError>) {
        let set = parse_str(json).unwrap();
        let output = build_model(&set.shapes, &GeneratorConfig::default());
        NameResolver::build(&output.model)
    }

    #[test]
    fn test_stdlib_collision() {
        let (resolver, errors) = resolve(r#"{"name": "Option"}"#);
        assert_eq!(errors.len(), 1);
        assert!(resolver.get("Option").is_none());
    }

    #[test]
    fn test_generated_name_collision() {
        let (resolver, errors) = resolve(r#"{"shapes": [{"name": "Person"}, {"name": "PersonParameters"}]}"#);
        assert!(resolver.get("Person").is_some());
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ModelError::TypeNameCollision { type_name, generated, .. }
                if type_name == "PersonParameters" && generated == "PersonParameters"
        ));
    }

    #[test]
    fn test_prefix_collision() {
        let (_, errors) = resolve(r#"{"shapes": [{"name": "PostalAddress"}, {"name": "Postal_address"}]}"#);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].type_name(), "Postal_address");
    }
}
