//! One generation run: input file in, generated Go text plus a report out.

use crate::classifier::{FieldBuckets, FieldClassifier, GenerationStrategy, PackageImport};
use crate::config::GenConfig;
use crate::emit::{render_function, render_header, FunctionPlan};
use crate::errors::{Error, Result};
use crate::parser::{default_package_name, CompilationUnit};
use crate::registry::PackageRegistry;
use crate::resolver::TypeResolver;
use crate::signature::{find_functions, FunctionSignature, OutputStruct};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    UnsupportedSignature,
    MissingOutput,
    UnresolvedField,
    DroppedField,
    /// The output struct's package failed to parse
    DependencyParse,
    Emit,
}

/// A degradation that did not stop the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub function: String,
    pub field: Option<String>,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{:?} {}.{}: {}", self.kind, self.function, field, self.message),
            None => write!(f, "{:?} {}: {}", self.kind, self.function, self.message),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Names of the generated functions, in source order
    pub generated: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerationReport {
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    fn push(&mut self, function: &str, field: Option<&str>, kind: DiagnosticKind, message: String) {
        self.diagnostics.push(Diagnostic {
            function: function.to_string(),
            field: field.map(str::to_string),
            kind,
            message,
        });
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct Generated {
    /// Package clause of the input, reused for the output
    pub package: String,
    pub text: String,
    pub report: GenerationReport,
}

pub struct Generator<'a> {
    registry: &'a PackageRegistry,
    config: &'a GenConfig,
}

impl<'a> Generator<'a> {
    pub fn new(registry: &'a PackageRegistry, config: &'a GenConfig) -> Self {
        Self { registry, config }
    }

    /// Generate conversions for every prefixed function in the package of
    /// `input` (an absolute file path).
    ///
    /// Only errors that stop symbol resolution altogether are returned;
    /// per-function and per-field problems end up in the report.
    pub fn generate(&self, input: &Path) -> Result<Generated> {
        let unit = self.registry.open_file(input)?;
        let scan = find_functions(self.registry, &unit, &self.config.function_prefix)?;

        let mut report = GenerationReport::default();
        for err in &scan.skipped {
            if let Error::UnsupportedSignature { function, reason } = err {
                report.push(function, None, DiagnosticKind::UnsupportedSignature, reason.clone());
            }
        }

        let classifier = FieldClassifier::new(
            TypeResolver::new(self.registry),
            self.config.conversion_prefix.as_str(),
            self.config.tag_key.as_str(),
        );
        let mut imports = BTreeSet::new();
        let mut bodies = Vec::new();

        for signature in &scan.functions {
            let Some(output) = &signature.output_struct else {
                report_missing_output(&mut report, signature);
                continue;
            };

            let buckets = classifier
                .classify(output, &signature.map_param, &unit)
                .map_err(|e| e.in_function(&signature.name))?;
            report_fields(&mut report, &signature.name, &buckets);

            let plan = FunctionPlan {
                name: format!("{}{}", self.config.generated_prefix, signature.name),
                param_name: &self.config.param_name,
                param_type: signature.map_param.go_type(),
                output_type: signature.output.qualified_name(),
                buckets: &buckets,
            };
            match render_function(&plan) {
                Ok(body) => {
                    info!(function = %signature.name, generated = %plan.name, "generated function");
                    imports.extend(self.function_imports(&unit, signature, output, &buckets));
                    bodies.push(body);
                    report.generated.push(plan.name);
                }
                Err(err) => {
                    warn!(function = %signature.name, error = %err, "rendering failed");
                    report.push(&signature.name, None, DiagnosticKind::Emit, err.to_string());
                }
            }
        }

        if report.generated.is_empty() {
            warn!(
                input = %input.display(),
                prefix = %self.config.function_prefix,
                "no functions generated"
            );
        }

        let imports: Vec<PackageImport> = imports.into_iter().collect();
        let mut text = render_header(&unit.name, &imports)?;
        for body in bodies {
            text.push_str(&body);
        }

        Ok(Generated {
            package: unit.name.clone(),
            text,
            report,
        })
    }

    /// Imports one generated function needs
    fn function_imports(
        &self,
        unit: &Arc<CompilationUnit>,
        signature: &FunctionSignature,
        output: &OutputStruct,
        buckets: &FieldBuckets,
    ) -> Vec<PackageImport> {
        let mut imports = Vec::new();

        if buckets.uses_conversion() {
            let name = self
                .config
                .conversion_package()
                .map(str::to_string)
                .unwrap_or_else(|| default_package_name(&self.config.conversion_import));
            imports.push(PackageImport {
                path: self.config.conversion_import.clone(),
                name,
            });
        }

        if let Some(qualifier) = &signature.output.package {
            if output.unit.dir != unit.dir {
                imports.push(PackageImport {
                    path: output.unit.import_path.clone(),
                    name: qualifier.clone(),
                });
            }
        }

        imports.extend(buckets.enum_imports().into_iter().cloned());
        imports
    }
}

fn report_missing_output(report: &mut GenerationReport, signature: &FunctionSignature) {
    let (kind, message) = match &signature.output_error {
        Some(err @ Error::Parse { .. }) => (DiagnosticKind::DependencyParse, err.to_string()),
        Some(err) => (DiagnosticKind::MissingOutput, err.to_string()),
        None => (
            DiagnosticKind::MissingOutput,
            format!("output {} not found", signature.output.qualified_name()),
        ),
    };
    warn!(function = %signature.name, %message, "skipping function without output struct");
    report.push(&signature.name, None, kind, message);
}

fn report_fields(report: &mut GenerationReport, function: &str, buckets: &FieldBuckets) {
    for field in &buckets.unsupported {
        if let GenerationStrategy::Unsupported { reason } = &field.strategy {
            report.push(
                function,
                Some(&field.name),
                DiagnosticKind::UnresolvedField,
                reason.clone(),
            );
        }
    }
    for dropped in &buckets.dropped {
        report.push(
            function,
            Some(&dropped.name),
            DiagnosticKind::DroppedField,
            dropped.reason.clone(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_locator::{ModuleInfo, ModuleLocator, ModuleMetadataProvider};
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

    fn run(gen_src: &str) -> Generated {
        let tmp = tempfile::TempDir::new().unwrap();
        let gen_dir = tmp.path().join("gen");
        fs::create_dir_all(&gen_dir).unwrap();
        fs::write(gen_dir.join("gen.go"), gen_src).unwrap();

        let registry = PackageRegistry::new(ModuleLocator::new(Box::new(NoModules)));
        let config = GenConfig::default();
        Generator::new(&registry, &config)
            .generate(&gen_dir.join("gen.go"))
            .unwrap()
    }

    #[test]
    fn test_local_output_needs_only_conversion_import() {
        let generated = run(r#"package gen

type Book struct {
	Id   int64  `json:"id"`
	Kind []byte `json:"kind"`
}

func MapToBook(src map[string]interface{}) (*Book, error) { return nil, nil }

func MapToNothing() {}
"#);

        assert_eq!(generated.package, "gen");
        assert_eq!(generated.report.generated, vec!["genMapToBook".to_string()]);
        assert!(generated.text.contains("import \"github.com/spf13/cast\"\n"));
        assert!(generated.text.contains("obj = &Book{}"));
        assert!(generated.text.contains("obj.Id = cast.ToInt64(src[\"id\"])"));
        assert!(generated.text.contains("// obj.Kind = ?"));
        assert_eq!(generated.report.count(DiagnosticKind::UnsupportedSignature), 1);
        assert_eq!(generated.report.count(DiagnosticKind::UnresolvedField), 1);
    }

    #[test]
    fn test_no_conversion_no_import() {
        let generated = run(r#"package gen

type Pair struct {
	Key string `json:"key"`
}

func MapToPair(src map[string]string) (*Pair, error) { return nil, nil }
"#);
        assert!(!generated.text.contains("import"));
        assert!(generated.text.contains("obj.Key = src[\"key\"]"));
    }

    #[test]
    fn test_missing_output_is_reported_not_fatal() {
        let generated = run(r#"package gen

func MapToGhost(src map[string]interface{}) (*Ghost, error) { return nil, nil }
"#);
        assert!(generated.report.generated.is_empty());
        assert_eq!(generated.report.count(DiagnosticKind::MissingOutput), 1);
        assert!(!generated.text.contains("func "));
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic {
            function: "MapToBook".into(),
            field: Some("Meta".into()),
            kind: DiagnosticKind::DroppedField,
            message: "type Meta is a struct, not a named primitive".into(),
        };
        assert_eq!(
            diagnostic.to_string(),
            "DroppedField MapToBook.Meta: type Meta is a struct, not a named primitive"
        );
    }
}
