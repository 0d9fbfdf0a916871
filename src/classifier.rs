//! Field Classifier.
//!
//! Buckets every field of an output struct by how the generated code can
//! populate it from the input map. Each field ends up in exactly one
//! bucket or in `dropped`; order within a bucket is declaration order.

use crate::errors::{Error, Result};
use crate::naming::conversion_function;
use crate::parser::{CompilationUnit, StructField, TypeExpr};
use crate::resolver::{EnumLookup, TypeDescriptor, TypeKind, TypeResolver};
use crate::signature::{MapParam, OutputStruct};
use std::sync::Arc;
use tracing::{debug, warn};

/// A package the generated file has to import, and the name it uses for it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageImport {
    pub path: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationStrategy {
    /// `obj.F = conv(src["k"])`, or a plain index when types line up
    Direct { conversion: Option<String> },
    /// Named type over a primitive: `T(conv(tmp))`
    Enum {
        /// Type name as the generated file spells it, e.g. `model.Status`
        type_cast: String,
        conversion: String,
        import: Option<PackageImport>,
    },
    /// Pointer to a primitive, assigned through a local value
    Assign { conversion: String },
    /// Left for a human as a commented placeholder
    Unsupported { reason: String },
}

impl GenerationStrategy {
    pub fn conversion(&self) -> Option<&str> {
        match self {
            GenerationStrategy::Direct { conversion } => conversion.as_deref(),
            GenerationStrategy::Enum { conversion, .. }
            | GenerationStrategy::Assign { conversion } => Some(conversion),
            GenerationStrategy::Unsupported { .. } => None,
        }
    }
}

/// A classified field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    /// Map key the value is read from
    pub key_name: String,
    /// Declared type as written in the struct
    pub go_type: String,
    pub descriptor: TypeDescriptor,
    pub is_pointer: bool,
    /// Field type name equals the map's value type name
    pub type_equal: bool,
    pub strategy: GenerationStrategy,
}

/// A field deliberately left out of generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedField {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldBuckets {
    pub direct: Vec<FieldDescriptor>,
    pub enums: Vec<FieldDescriptor>,
    pub assign: Vec<FieldDescriptor>,
    pub unsupported: Vec<FieldDescriptor>,
    pub dropped: Vec<DroppedField>,
}

impl FieldBuckets {
    /// Fields that receive an assignment, in emission order
    pub fn assigned(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.direct.iter().chain(&self.enums).chain(&self.assign)
    }

    pub fn uses_conversion(&self) -> bool {
        self.assigned().any(|f| f.strategy.conversion().is_some())
    }

    /// Packages enum casts refer to, sorted and deduplicated
    pub fn enum_imports(&self) -> Vec<&PackageImport> {
        let mut imports: Vec<&PackageImport> = self
            .enums
            .iter()
            .filter_map(|f| match &f.strategy {
                GenerationStrategy::Enum { import, .. } => import.as_ref(),
                _ => None,
            })
            .collect();
        imports.sort();
        imports.dedup();
        imports
    }

    pub fn len(&self) -> usize {
        self.direct.len()
            + self.enums.len()
            + self.assign.len()
            + self.unsupported.len()
            + self.dropped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, field: FieldDescriptor) {
        let bucket = match field.strategy {
            GenerationStrategy::Direct { .. } => &mut self.direct,
            GenerationStrategy::Enum { .. } => &mut self.enums,
            GenerationStrategy::Assign { .. } => &mut self.assign,
            GenerationStrategy::Unsupported { .. } => &mut self.unsupported,
        };
        bucket.push(field);
    }
}

enum Outcome {
    Keep(GenerationStrategy),
    Drop(String),
}

pub struct FieldClassifier<'r> {
    resolver: TypeResolver<'r>,
    conversion_prefix: String,
    tag_key: String,
}

impl<'r> FieldClassifier<'r> {
    pub fn new(
        resolver: TypeResolver<'r>,
        conversion_prefix: impl Into<String>,
        tag_key: impl Into<String>,
    ) -> Self {
        Self {
            resolver,
            conversion_prefix: conversion_prefix.into(),
            tag_key: tag_key.into(),
        }
    }

    /// Classify the fields of `output` for a function declared in
    /// `generating`. Only module resolution failures are returned as
    /// errors; everything else lands in a bucket.
    pub fn classify(
        &self,
        output: &OutputStruct,
        map_param: &MapParam,
        generating: &Arc<CompilationUnit>,
    ) -> Result<FieldBuckets> {
        let mut buckets = FieldBuckets::default();

        for field in &output.fields {
            let descriptor = self.resolver.describe(&field.ty, &output.unit);
            let outcome = self.strategy_for(field, &descriptor, output, map_param, generating)?;

            match outcome {
                Outcome::Keep(strategy) => {
                    if let GenerationStrategy::Unsupported { reason } = &strategy {
                        let err = Error::UnresolvedField {
                            structure: output.name.clone(),
                            field: field.name.clone(),
                            reason: reason.clone(),
                        };
                        warn!(error = %err, "field left for manual completion");
                    } else {
                        debug!(structure = %output.name, field = %field.name, ?strategy, "classified field");
                    }
                    buckets.push(FieldDescriptor {
                        name: field.name.clone(),
                        key_name: field.tag.key_name(&self.tag_key),
                        go_type: field.ty.to_string(),
                        type_equal: descriptor.name == map_param.value_type,
                        is_pointer: field.ty.is_pointer(),
                        descriptor,
                        strategy,
                    });
                }
                Outcome::Drop(reason) => {
                    warn!(structure = %output.name, field = %field.name, %reason, "dropping field");
                    buckets.dropped.push(DroppedField {
                        name: field.name.clone(),
                        reason,
                    });
                }
            }
        }

        Ok(buckets)
    }

    fn strategy_for(
        &self,
        field: &StructField,
        descriptor: &TypeDescriptor,
        output: &OutputStruct,
        map_param: &MapParam,
        generating: &Arc<CompilationUnit>,
    ) -> Result<Outcome> {
        if field.embedded {
            return Ok(unsupported(format!("embedded field {}", field.ty)));
        }

        match descriptor.kind {
            TypeKind::Base => Ok(self.primitive_strategy(field, descriptor, map_param)),
            TypeKind::Struct => self.enum_strategy(descriptor, output, generating),
            TypeKind::Interface | TypeKind::Pointer | TypeKind::Unknown => Ok(unsupported(
                format!("type {} has no generation strategy", field.ty),
            )),
        }
    }

    fn primitive_strategy(
        &self,
        field: &StructField,
        descriptor: &TypeDescriptor,
        map_param: &MapParam,
    ) -> Outcome {
        let conversion = conversion_function(&self.conversion_prefix, &descriptor.name);

        if let TypeExpr::Pointer(_) = field.ty {
            return Outcome::Keep(GenerationStrategy::Assign { conversion });
        }
        if map_param.value_is_open_interface {
            return Outcome::Keep(GenerationStrategy::Direct {
                conversion: Some(conversion),
            });
        }
        if descriptor.name == map_param.value_type {
            return Outcome::Keep(GenerationStrategy::Direct { conversion: None });
        }
        unsupported(format!(
            "map value type {} differs from field type {}",
            map_param.value_type, descriptor.name
        ))
    }

    fn enum_strategy(
        &self,
        descriptor: &TypeDescriptor,
        output: &OutputStruct,
        generating: &Arc<CompilationUnit>,
    ) -> Result<Outcome> {
        Ok(match self.resolver.resolve_enum(descriptor, &output.unit)? {
            EnumLookup::Enum { owner, primitive } => {
                let (type_cast, import) = cast_name(&descriptor.name, &owner, generating);
                Outcome::Keep(GenerationStrategy::Enum {
                    type_cast,
                    conversion: conversion_function(&self.conversion_prefix, &primitive),
                    import,
                })
            }
            EnumLookup::PackageUnavailable(reason) => unsupported(reason),
            EnumLookup::MultiHop(underlying) => unsupported(format!(
                "{} is declared over {underlying}; only one level is followed",
                descriptor.name
            )),
            EnumLookup::NotFound => Outcome::Drop(format!(
                "type {} not declared in package {}",
                descriptor.name,
                descriptor.package.name().unwrap_or_default()
            )),
            EnumLookup::NotEnum(underlying) => Outcome::Drop(format!(
                "type {} is a {underlying}, not a named primitive",
                descriptor.name
            )),
        })
    }
}

fn unsupported(reason: impl Into<String>) -> Outcome {
    Outcome::Keep(GenerationStrategy::Unsupported {
        reason: reason.into(),
    })
}

/// How the generated file names a type declared in `owner`. Types of the
/// generating package stay unqualified; others use the name the
/// generating package already imports them under, or the declared
/// package name.
fn cast_name(
    type_name: &str,
    owner: &CompilationUnit,
    generating: &CompilationUnit,
) -> (String, Option<PackageImport>) {
    if owner.dir == generating.dir {
        return (type_name.to_string(), None);
    }
    let qualifier = generating
        .qualifier_for(&owner.import_path)
        .unwrap_or(owner.name.as_str())
        .to_string();
    (
        format!("{qualifier}.{type_name}"),
        Some(PackageImport {
            path: owner.import_path.clone(),
            name: qualifier,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_locator::{ModuleInfo, ModuleLocator, ModuleMetadataProvider};
    use crate::registry::PackageRegistry;
    use crate::signature::find_functions;
    use std::fs;
    use std::path::PathBuf;

    struct NoModules;

    impl ModuleMetadataProvider for NoModules {
        fn query(&self, _: &str) -> Result<Option<ModuleInfo>> {
            Ok(None)
        }

        fn goroot(&self) -> Option<PathBuf> {
            None
        }
    }

    struct Fixture {
        tmp: tempfile::TempDir,
        registry: PackageRegistry,
        gen: Arc<CompilationUnit>,
    }

    /// `gen/gen.go` with `MODEL_DIR` replaced by the model package's directory
    fn fixture(gen_src: &str, model_src: &str) -> Fixture {
        let tmp = tempfile::TempDir::new().unwrap();
        let model_dir = tmp.path().join("model");
        fs::create_dir_all(&model_dir).unwrap();
        fs::create_dir_all(tmp.path().join("gen")).unwrap();
        fs::write(model_dir.join("model.go"), model_src).unwrap();
        fs::write(
            tmp.path().join("gen/gen.go"),
            gen_src.replace("MODEL_DIR", &model_dir.to_string_lossy()),
        )
        .unwrap();

        let registry = PackageRegistry::new(ModuleLocator::new(Box::new(NoModules)));
        let gen = registry.open_file(&tmp.path().join("gen/gen.go")).unwrap();
        Fixture {
            tmp,
            registry,
            gen,
        }
    }

    fn classify(fx: &Fixture, function: &str) -> FieldBuckets {
        let scan = find_functions(&fx.registry, &fx.gen, "MapTo").unwrap();
        let signature = scan.get(function).unwrap();
        let classifier = FieldClassifier::new(TypeResolver::new(&fx.registry), "cast.To", "json");
        classifier
            .classify(
                signature.output_struct.as_ref().unwrap(),
                &signature.map_param,
                &fx.gen,
            )
            .unwrap()
    }

    fn names(fields: &[FieldDescriptor]) -> Vec<&str> {
        fields.iter().map(|f| f.name.as_str()).collect()
    }

    const GEN: &str = r#"package gen

import "MODEL_DIR"

func MapToBook(src map[string]interface{}) (*model.Book, error) { return nil, nil }

func MapToTyped(src map[string]string) (*model.Typed, error) { return nil, nil }
"#;

    const MODEL: &str = r#"package model

type Status int64

type Level Status

type Meta struct{ Note string }

type Book struct {
	Id     int64   `json:"id"`
	Name   string  `json:"name"`
	Tag    *string `json:"tag,omitempty"`
	Status *Status `json:"status"`
	Level  Level   `json:"level"`
	Meta   Meta    `json:"meta"`
	Weird  UnknownPkg.Weird `json:"weird"`
	Tags   []string `json:"tags"`
	Extra  interface{}
	Hidden string `json:"-"`
}

type Typed struct {
	Title string `json:"title"`
	Count int    `json:"count"`
	Note  *string `json:"note"`
}
"#;

    #[test]
    fn test_open_interface_scenario() {
        let fx = fixture(GEN, MODEL);
        let buckets = classify(&fx, "MapToBook");

        assert_eq!(names(&buckets.direct), vec!["Id", "Name", "Hidden"]);
        assert_eq!(
            buckets.direct[0].strategy,
            GenerationStrategy::Direct {
                conversion: Some("cast.ToInt64".into())
            }
        );
        assert_eq!(
            buckets.direct[1].strategy,
            GenerationStrategy::Direct {
                conversion: Some("cast.ToString".into())
            }
        );
        assert_eq!(buckets.direct[0].key_name, "id");

        assert_eq!(names(&buckets.assign), vec!["Tag"]);
        assert_eq!(buckets.assign[0].key_name, "tag");
        assert!(buckets.assign[0].is_pointer);
    }

    #[test]
    fn test_enum_hop_through_output_package() {
        let fx = fixture(GEN, MODEL);
        let buckets = classify(&fx, "MapToBook");

        assert_eq!(names(&buckets.enums), vec!["Status"]);
        let model_path = fx.tmp.path().join("model").to_string_lossy().into_owned();
        assert_eq!(
            buckets.enums[0].strategy,
            GenerationStrategy::Enum {
                type_cast: "model.Status".into(),
                conversion: "cast.ToInt64".into(),
                import: Some(PackageImport {
                    path: model_path,
                    name: "model".into(),
                }),
            }
        );
        assert!(buckets.enums[0].is_pointer);
    }

    #[test]
    fn test_unsupported_and_dropped_fields() {
        let fx = fixture(GEN, MODEL);
        let buckets = classify(&fx, "MapToBook");

        assert_eq!(
            names(&buckets.unsupported),
            vec!["Level", "Weird", "Tags", "Extra"]
        );
        assert_eq!(buckets.dropped.len(), 1);
        assert_eq!(buckets.dropped[0].name, "Meta");
        assert_eq!(buckets.unsupported[3].key_name, "");
    }

    #[test]
    fn test_dash_and_missing_tags_only_blank_the_key() {
        let fx = fixture(
            r#"package gen

import "MODEL_DIR"

func MapToT(src map[string]string) (*model.T, error) { return nil, nil }
"#,
            "package model\n\ntype T struct {\n\tP *string `json:\"-\"`\n\tS string `json:\"-\"`\n\tN string\n}\n",
        );
        let buckets = classify(&fx, "MapToT");

        assert_eq!(names(&buckets.assign), vec!["P"]);
        assert_eq!(names(&buckets.direct), vec!["S", "N"]);
        assert!(buckets.unsupported.is_empty());
        assert_eq!(
            buckets.direct[1].strategy,
            GenerationStrategy::Direct { conversion: None }
        );
        for field in buckets.assign.iter().chain(&buckets.direct) {
            assert_eq!(field.key_name, "", "{}", field.name);
        }
    }

    #[test]
    fn test_every_field_lands_somewhere() {
        let fx = fixture(GEN, MODEL);
        let buckets = classify(&fx, "MapToBook");
        let signature = find_functions(&fx.registry, &fx.gen, "MapTo").unwrap();
        let declared = signature.get("MapToBook").unwrap().output_struct.as_ref().unwrap().fields.len();
        assert_eq!(declared, 10);
        assert_eq!(buckets.len(), declared);
    }

    #[test]
    fn test_typed_map_values() {
        let fx = fixture(GEN, MODEL);
        let buckets = classify(&fx, "MapToTyped");

        assert_eq!(names(&buckets.direct), vec!["Title"]);
        assert_eq!(
            buckets.direct[0].strategy,
            GenerationStrategy::Direct { conversion: None }
        );
        assert!(buckets.direct[0].type_equal);
        assert_eq!(names(&buckets.unsupported), vec!["Count"]);
        assert_eq!(
            buckets.assign[0].strategy,
            GenerationStrategy::Assign {
                conversion: "cast.ToString".into()
            }
        );
        assert!(buckets.uses_conversion());
    }

    #[test]
    fn test_local_enum_stays_unqualified() {
        let fx = fixture(
            r#"package gen

type Kind uint8

type Local struct {
	Kind *Kind `json:"kind"`
}

func MapToLocal(src map[string]any) (*Local, error) { return nil, nil }
"#,
            "package model\n",
        );
        let buckets = classify(&fx, "MapToLocal");
        assert_eq!(
            buckets.enums[0].strategy,
            GenerationStrategy::Enum {
                type_cast: "Kind".into(),
                conversion: "cast.ToUint8".into(),
                import: None,
            }
        );
        assert!(buckets.enum_imports().is_empty());
    }

    #[test]
    fn test_aliased_import_is_reused_for_casts() {
        let fx = fixture(
            r#"package gen

import m "MODEL_DIR"

func MapToBook(src map[string]interface{}) (*m.Book, error) { return nil, nil }
"#,
            "package model\n\ntype Status string\n\ntype Book struct {\n\tStatus Status `json:\"status\"`\n}\n",
        );
        let buckets = classify(&fx, "MapToBook");
        match &buckets.enums[0].strategy {
            GenerationStrategy::Enum {
                type_cast, import, ..
            } => {
                assert_eq!(type_cast, "m.Status");
                assert_eq!(import.as_ref().map(|i| i.name.as_str()), Some("m"));
            }
            other => panic!("expected enum, got {other:?}"),
        }
        assert!(!buckets.enums[0].is_pointer);
    }
}
