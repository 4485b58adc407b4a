//! Script compilation: type stripping, environment substitution and ES module
//! rewriting.
//!
//! Each module becomes a function body inside the bundle. Import declarations
//! turn into `__sprout_require` calls (or into literals for assets) hoisted to
//! the top of the body, and export declarations assign onto the module's
//! `exports` object. TypeScript sources have their types removed first.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    BindingPatternKind, Declaration, ExportDefaultDeclarationKind, Expression,
    ImportDeclarationSpecifier, Program, StaticMemberExpression, Statement,
};
use oxc_ast_visit::{walk, Visit};
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::{GetSpan, SourceType};
use oxc_transformer::{TransformOptions, Transformer};

use crate::error::PipelineError;

/// Extensions compiled as TypeScript.
pub const TYPESCRIPT_EXTENSIONS: &[&str] = &["ts", "mts"];

/// A name bound by an import declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// `import local from "..."`
    Default(String),
    /// `import { imported as local } from "..."`
    Named { imported: String, local: String },
    /// `import * as local from "..."`
    Namespace(String),
}

impl Binding {
    pub fn local(&self) -> &str {
        match self {
            Binding::Default(local) | Binding::Namespace(local) => local,
            Binding::Named { local, .. } => local,
        }
    }
}

/// An import declaration found in a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub specifier: String,
    pub bindings: Vec<Binding>,
    start: u32,
    end: u32,
}

/// What an import resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTarget {
    /// Another bundled module
    Module(usize),
    /// A URL or data URI
    Asset(String),
    /// A style sheet to inject
    Style(String),
}

#[derive(Debug, Clone)]
struct Edit {
    start: u32,
    end: u32,
    text: String,
}

/// A parsed module, ready to be rewritten once its imports are resolved.
#[derive(Debug, Clone)]
pub struct ParsedModule {
    source: String,
    imports: Vec<Import>,
    edits: Vec<Edit>,
    trailer: Vec<String>,
    /// Offset after any hashbang and directive prologue
    body_start: u32,
}

impl ParsedModule {
    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    /// JavaScript source the edits apply to; for TypeScript, the type-stripped output.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Produce the module body. `targets` lines up with [`ParsedModule::imports`].
    ///
    /// Import declarations are removed in place and their replacements are
    /// emitted together at the top of the body, so imported bindings exist
    /// before any statement runs.
    pub fn rewrite(&self, targets: &[ImportTarget]) -> String {
        let mut edits = self.edits.clone();
        let mut prelude = Vec::new();

        for (index, (import, target)) in self.imports.iter().zip(targets).enumerate() {
            edits.push(Edit {
                start: import.start,
                end: import.end,
                text: String::new(),
            });
            prelude.push(import_replacement(index, import, target));
        }

        edits.sort_by(|a, b| b.start.cmp(&a.start));

        // Applied last among edits at the same offset, so a removal there
        // cannot swallow it.
        if !prelude.is_empty() {
            let mut text = prelude.join("\n");
            text.push('\n');
            edits.push(Edit {
                start: self.body_start,
                end: self.body_start,
                text,
            });
            edits.sort_by(|a, b| b.start.cmp(&a.start));
        }

        let mut code = self.source.clone();
        for edit in edits {
            code.replace_range(edit.start as usize..edit.end as usize, &edit.text);
        }

        if !self.trailer.is_empty() {
            if !code.ends_with('\n') {
                code.push('\n');
            }
            code.push_str(&self.trailer.join("\n"));
            code.push('\n');
        }

        code
    }
}

fn import_replacement(index: usize, import: &Import, target: &ImportTarget) -> String {
    let mut parts = Vec::new();

    match target {
        ImportTarget::Module(id) => {
            let handle = format!("__sprout_import_{}", index);
            parts.push(format!("const {} = __sprout_require({});", handle, id));
            for binding in &import.bindings {
                parts.push(match binding {
                    Binding::Default(local) => format!("const {} = {}.default;", local, handle),
                    Binding::Named { imported, local } => {
                        format!("const {} = {}[{}];", local, handle, js_string(imported))
                    }
                    Binding::Namespace(local) => format!("const {} = {};", local, handle),
                });
            }
        }
        ImportTarget::Asset(reference) => {
            for binding in &import.bindings {
                parts.push(format!("const {} = {};", binding.local(), js_string(reference)));
            }
        }
        ImportTarget::Style(css) => {
            parts.push(format!("__sprout_style({});", js_string(css)));
            for binding in &import.bindings {
                parts.push(format!("const {} = {};", binding.local(), js_string(css)));
            }
        }
    }

    parts.join(" ")
}

/// JSON string literal, which is also a valid JavaScript string literal.
pub(crate) fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// Dotted name of an identifier or a chain of static member accesses.
fn dotted_name(expr: &Expression<'_>) -> Option<String> {
    match expr {
        Expression::Identifier(ident) => Some(ident.name.to_string()),
        Expression::StaticMemberExpression(member) => static_member_name(member),
        _ => None,
    }
}

fn static_member_name(member: &StaticMemberExpression<'_>) -> Option<String> {
    if member.optional {
        return None;
    }
    let object = dotted_name(&member.object)?;
    Some(format!("{}.{}", object, member.property.name))
}

/// Finds member expressions spelling exactly a define key, e.g.
/// `process.env.NODE_ENV`. String contents, longer chains such as
/// `obj.process.env.NODE_ENV` and prefixes such as `process.env.names`
/// are left alone.
struct DefineCollector<'d> {
    defines: &'d [(String, String)],
    edits: Vec<Edit>,
}

impl<'a> Visit<'a> for DefineCollector<'_> {
    fn visit_static_member_expression(&mut self, it: &StaticMemberExpression<'a>) {
        if let Some(name) = static_member_name(it) {
            if let Some((_, value)) = self.defines.iter().find(|(key, _)| *key == name) {
                self.edits.push(Edit {
                    start: it.span.start,
                    end: it.span.end,
                    text: js_string(value),
                });
                return;
            }
        }
        walk::walk_static_member_expression(self, it);
    }
}

fn syntax_error(path: &str, message: impl Into<String>) -> PipelineError {
    PipelineError::SyntaxError {
        path: path.to_string(),
        message: message.into(),
    }
}

fn is_typescript(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| TYPESCRIPT_EXTENSIONS.contains(&ext))
}

/// Remove type annotations and type-only declarations from a TypeScript module.
pub fn strip_types(path: &Path, source: &str) -> Result<String, PipelineError> {
    let display = path.display().to_string();
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::ts()).parse();

    if let Some(err) = ret.errors.first() {
        return Err(syntax_error(&display, err.to_string()));
    }
    if ret.panicked {
        return Err(syntax_error(&display, "parser aborted"));
    }

    let mut program = ret.program;
    let scoping = SemanticBuilder::new()
        .build(&program)
        .semantic
        .into_scoping();

    let options = TransformOptions::default();
    let transformed =
        Transformer::new(&allocator, path, &options).build_with_scoping(scoping, &mut program);
    if let Some(err) = transformed.errors.first() {
        return Err(PipelineError::UnsupportedSyntax {
            path: display,
            message: err.to_string(),
        });
    }

    Ok(Codegen::new().build(&program).code)
}

/// Offset where module statements begin, after a hashbang and directives.
fn body_start(source: &str, program: &Program<'_>) -> u32 {
    let hashbang = program.hashbang.as_ref().map_or(0, |h| h.span.end);
    let directives = program.directives.last().map_or(0, |d| d.span.end);
    match hashbang.max(directives) {
        0 => 0,
        end => through_newline(source, end),
    }
}

/// Extend a statement span over the line break that follows it.
fn through_newline(source: &str, end: u32) -> u32 {
    match source.as_bytes().get(end as usize) {
        Some(b'\n') => end + 1,
        _ => end,
    }
}

/// Parse a module and record the edits that compile it, replacing every
/// `defines` key used as an expression with its string literal.
pub fn parse_module(
    path: &Path,
    source: &str,
    defines: &[(String, String)],
) -> Result<ParsedModule, PipelineError> {
    let display = path.display().to_string();
    let source = if is_typescript(path) {
        strip_types(path, source)?
    } else {
        source.to_string()
    };

    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, &source, SourceType::mjs()).parse();

    if let Some(err) = ret.errors.first() {
        return Err(syntax_error(&display, err.to_string()));
    }
    if ret.panicked {
        return Err(syntax_error(&display, "parser aborted"));
    }

    let mut imports = Vec::new();
    let mut edits = Vec::new();
    let mut trailer = Vec::new();

    if !defines.is_empty() {
        let mut collector = DefineCollector {
            defines,
            edits: Vec::new(),
        };
        collector.visit_program(&ret.program);
        edits.extend(collector.edits);
    }

    for stmt in &ret.program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => {
                let specifiers: Vec<&ImportDeclarationSpecifier<'_>> = match &decl.specifiers {
                    Some(specifiers) => specifiers.iter().collect(),
                    None => Vec::new(),
                };
                let bindings = specifiers
                    .into_iter()
                    .map(|spec| match spec {
                        ImportDeclarationSpecifier::ImportSpecifier(s) => Binding::Named {
                            imported: s.imported.name().to_string(),
                            local: s.local.name.to_string(),
                        },
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                            Binding::Default(s.local.name.to_string())
                        }
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                            Binding::Namespace(s.local.name.to_string())
                        }
                    })
                    .collect();

                imports.push(Import {
                    specifier: decl.source.value.to_string(),
                    bindings,
                    start: decl.span.start,
                    end: through_newline(&source, decl.span.end),
                });
            }

            Statement::ExportDefaultDeclaration(decl) => {
                let declared = match &decl.declaration {
                    ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                        func.id.as_ref().map(|id| id.name.to_string())
                    }
                    ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                        class.id.as_ref().map(|id| id.name.to_string())
                    }
                    _ => None,
                };

                // A named declaration keeps its binding in module scope.
                let text = match declared {
                    Some(name) => {
                        trailer.push(format!("exports.default = {};", name));
                        String::new()
                    }
                    None => "exports.default = ".to_string(),
                };
                edits.push(Edit {
                    start: decl.span.start,
                    end: decl.declaration.span().start,
                    text,
                });
            }

            Statement::ExportNamedDeclaration(decl) => {
                if decl.source.is_some() {
                    return Err(PipelineError::UnsupportedSyntax {
                        path: display,
                        message: "re-exports from another module".to_string(),
                    });
                }

                if let Some(declaration) = &decl.declaration {
                    edits.push(Edit {
                        start: decl.span.start,
                        end: declaration.span().start,
                        text: String::new(),
                    });
                    for name in declared_names(declaration, &display)? {
                        trailer.push(format!("exports.{0} = {0};", name));
                    }
                } else {
                    let assigns: Vec<String> = decl
                        .specifiers
                        .iter()
                        .map(|s| {
                            format!(
                                "exports[{}] = {};",
                                js_string(&s.exported.name()),
                                s.local.name()
                            )
                        })
                        .collect();
                    edits.push(Edit {
                        start: decl.span.start,
                        end: decl.span.end,
                        text: assigns.join(" "),
                    });
                }
            }

            Statement::ExportAllDeclaration(_) => {
                return Err(PipelineError::UnsupportedSyntax {
                    path: display,
                    message: "export * declarations".to_string(),
                });
            }

            _ => {}
        }
    }

    let body_start = body_start(&source, &ret.program);
    drop(ret);

    Ok(ParsedModule {
        source,
        imports,
        edits,
        trailer,
        body_start,
    })
}

fn declared_names(declaration: &Declaration<'_>, path: &str) -> Result<Vec<String>, PipelineError> {
    let unsupported = |what: &str| PipelineError::UnsupportedSyntax {
        path: path.to_string(),
        message: what.to_string(),
    };

    match declaration {
        Declaration::VariableDeclaration(var) => var
            .declarations
            .iter()
            .map(|d| match &d.id.kind {
                BindingPatternKind::BindingIdentifier(ident) => Ok(ident.name.to_string()),
                _ => Err(unsupported("destructuring in export declarations")),
            })
            .collect(),
        Declaration::FunctionDeclaration(func) => Ok(func
            .id
            .iter()
            .map(|id| id.name.to_string())
            .collect()),
        Declaration::ClassDeclaration(class) => Ok(class
            .id
            .iter()
            .map(|id| id.name.to_string())
            .collect()),
        _ => Err(unsupported("type-only export declarations")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> ParsedModule {
        parse_module(Path::new("src/index.js"), source, &[]).unwrap()
    }

    #[test]
    fn collects_imports_with_bindings() {
        let module = parse(
            "import './styles.css';\nimport logo from './logo.png';\nimport { a, b as c } from './lib.js';\nimport * as ns from './ns.js';\n",
        );

        let specifiers: Vec<&str> = module
            .imports()
            .iter()
            .map(|i| i.specifier.as_str())
            .collect();
        assert_eq!(specifiers, vec!["./styles.css", "./logo.png", "./lib.js", "./ns.js"]);

        assert!(module.imports()[0].bindings.is_empty());
        assert_eq!(module.imports()[1].bindings, vec![Binding::Default("logo".to_string())]);
        assert_eq!(
            module.imports()[2].bindings,
            vec![
                Binding::Named {
                    imported: "a".to_string(),
                    local: "a".to_string()
                },
                Binding::Named {
                    imported: "b".to_string(),
                    local: "c".to_string()
                },
            ]
        );
        assert_eq!(module.imports()[3].bindings, vec![Binding::Namespace("ns".to_string())]);
    }

    #[test]
    fn rewrites_imports_by_target() {
        let module = parse("import './styles.css';\nimport logo from './logo.png';\nimport greet from './greet.js';\ngreet(logo);\n");

        let code = module.rewrite(&[
            ImportTarget::Style("body{margin:0}".to_string()),
            ImportTarget::Asset("/logo.1234abcd.png".to_string()),
            ImportTarget::Module(3),
        ]);

        assert_eq!(
            code,
            "__sprout_style(\"body{margin:0}\");\nconst logo = \"/logo.1234abcd.png\";\nconst __sprout_import_2 = __sprout_require(3); const greet = __sprout_import_2.default;\ngreet(logo);\n"
        );
    }

    #[test]
    fn rewrites_exports_onto_exports_object() {
        let module = parse("export const answer = 42;\nexport function hello() { return 'hi'; }\nconst x = 1;\nexport { x as y };\nexport default hello;\n");

        let code = module.rewrite(&[]);

        assert!(code.contains("const answer = 42;"));
        assert!(!code.contains("export "));
        assert!(code.contains("exports.default = hello;"));
        assert!(code.contains("exports[\"y\"] = x;"));
        assert!(code.ends_with("exports.answer = answer;\nexports.hello = hello;\n"));
    }

    fn defines() -> Vec<(String, String)> {
        vec![
            ("process.env.NODE_ENV".to_string(), "production".to_string()),
            ("process.env.name".to_string(), "abc".to_string()),
        ]
    }

    fn compile(path: &str, source: &str) -> String {
        parse_module(Path::new(path), source, &defines())
            .unwrap()
            .rewrite(&[])
    }

    #[test]
    fn substitutes_environment_defines() {
        let code = compile(
            "src/index.js",
            "console.log(process.env.NODE_ENV, process.env.name, process.env.names);\n",
        );

        assert_eq!(
            code,
            "console.log(\"production\", \"abc\", process.env.names);\n"
        );
    }

    #[test]
    fn defines_leave_string_literals_alone() {
        let code = compile(
            "src/index.js",
            "console.log(\"process.env.name is\", process.env.name, `process.env.NODE_ENV`);\n",
        );

        assert_eq!(
            code,
            "console.log(\"process.env.name is\", \"abc\", `process.env.NODE_ENV`);\n"
        );
    }

    #[test]
    fn defines_only_match_whole_member_chains() {
        let code = compile(
            "src/index.js",
            "const a = obj.process.env.name;\nconst b = process.env.name.length;\n",
        );

        assert_eq!(
            code,
            "const a = obj.process.env.name;\nconst b = \"abc\".length;\n"
        );
    }

    #[test]
    fn define_values_are_escaped_as_literals() {
        let defines = vec![("process.env.name".to_string(), "$1 \"q\"".to_string())];
        let code = parse_module(Path::new("src/index.js"), "x = process.env.name;", &defines)
            .unwrap()
            .rewrite(&[]);

        assert_eq!(code, r#"x = "$1 \"q\"";"#);
    }

    #[test]
    fn named_default_export_stays_bound() {
        let code = compile(
            "src/greet.js",
            "export default function greet() { return 'hi'; }\nconst msg = greet();\n",
        );

        assert_eq!(
            code,
            "function greet() { return 'hi'; }\nconst msg = greet();\nexports.default = greet;\n"
        );
    }

    #[test]
    fn anonymous_default_export_is_assigned() {
        let code = compile("src/lib.js", "export default class { }\n");

        assert_eq!(code, "exports.default = class { }\n");
    }

    #[test]
    fn imports_are_hoisted_above_first_use() {
        let module = parse("'use strict';\ngreet();\nimport greet from './greet.js';\n");

        let code = module.rewrite(&[ImportTarget::Module(1)]);

        assert_eq!(
            code,
            "'use strict';\nconst __sprout_import_0 = __sprout_require(1); const greet = __sprout_import_0.default;\ngreet();\n"
        );
    }

    #[test]
    fn strips_typescript_types() {
        let code = compile(
            "src/greet.ts",
            "interface Options { loud: boolean }\nexport function greet(name: string, options?: Options): string {\n  return options?.loud ? name.toUpperCase() : name;\n}\nconsole.log(process.env.NODE_ENV as string);\n",
        );

        assert!(!code.contains("interface"));
        assert!(!code.contains(": string"));
        assert!(code.contains("function greet(name, options)"));
        assert!(code.contains("console.log(\"production\")"));
        assert!(code.ends_with("exports.greet = greet;\n"));
    }

    #[test]
    fn reports_typescript_syntax_errors() {
        let err = parse_module(Path::new("src/broken.ts"), "let x: = 1;", &[]).unwrap_err();
        assert!(matches!(err, PipelineError::SyntaxError { .. }));
    }

    #[test]
    fn reports_syntax_errors() {
        let err = parse_module(Path::new("src/broken.js"), "const = ;", &[]).unwrap_err();

        match err {
            PipelineError::SyntaxError { path, .. } => assert_eq!(path, "src/broken.js"),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_reexports() {
        let err = parse_module(Path::new("src/a.js"), "export * from './b.js';", &[]).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedSyntax { .. }));
    }
}
