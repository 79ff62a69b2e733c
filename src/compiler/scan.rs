//! Behaviour discovery.
//!
//! Finds every `impl Behaviour for Type` in the collected sources, including
//! impls inside inline modules and impls for types another file declares.
//! Each hit becomes one row of the registry table the generated crate exports,
//! in file order then declaration order.
//!
//! ```text
//! pass 1: TypeIndex    every struct/enum/union, with root reachability
//! pass 2: impls        resolve the target against the index
//! ```

use rustc_hash::FxHashMap;
use syn::spanned::Spanned;
use syn::{Item, ItemImpl, Type, Visibility};

use super::diagnostic::{Diagnostic, Location};
use super::source::SourceUnit;

/// Name of the capability trait plugin types implement.
pub const CAPABILITY_TRAIT: &str = "Behaviour";

/// One discovered behaviour type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSpec {
    /// Module of the declaring item in the generated crate, `::`-separated
    pub module: String,
    pub type_name: String,
    pub location: Location,
}

impl ExportSpec {
    /// Crate-relative path, also the name the registry reports.
    pub fn path(&self) -> String {
        format!("{}::{}", self.module, self.type_name)
    }
}

/// Result of scanning one compile unit.
#[derive(Debug, Default)]
pub struct Scan {
    pub exports: Vec<ExportSpec>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Scan all sources in order.
///
/// Files that do not parse contribute nothing; the compiler reports the
/// syntax error with better context than a scan could.
pub fn scan_sources(sources: &[SourceUnit]) -> Scan {
    let files: Vec<(&SourceUnit, syn::File)> = sources
        .iter()
        .filter_map(|unit| syn::parse_file(&unit.content).ok().map(|file| (unit, file)))
        .collect();

    let mut index = TypeIndex::default();
    for (unit, file) in &files {
        index.collect(&file.items, &[unit.module_name.clone()], true);
    }

    let mut scan = Scan::default();
    for (unit, file) in &files {
        scan_items(unit, &file.items, &[unit.module_name.clone()], &index, &mut scan);
    }
    scan
}

// ============================================================================
// Type index
// ============================================================================

/// Every type declaration of the unit.
#[derive(Debug, Default)]
struct TypeIndex {
    /// `a::flock::Boid` -> visible from the crate root
    types: FxHashMap<String, bool>,
    /// Type name -> file modules declaring it at top level
    top_level: FxHashMap<String, Vec<String>>,
}

/// A resolved impl target.
#[derive(Debug)]
struct Target {
    module: String,
    type_name: String,
    reachable: bool,
}

impl TypeIndex {
    fn collect(&mut self, items: &[Item], module: &[String], module_reachable: bool) {
        for item in items {
            match item {
                Item::Struct(s) => self.insert(module, &s.ident, &s.vis, module_reachable),
                Item::Enum(e) => self.insert(module, &e.ident, &e.vis, module_reachable),
                Item::Union(u) => self.insert(module, &u.ident, &u.vis, module_reachable),
                Item::Mod(m) => {
                    if let Some((_, content)) = &m.content {
                        let reachable = module_reachable && reaches_root(&m.vis, module.len());
                        self.collect(content, &child(module, &m.ident), reachable);
                    }
                }
                _ => {}
            }
        }
    }

    fn insert(
        &mut self,
        module: &[String],
        ident: &syn::Ident,
        vis: &Visibility,
        module_reachable: bool,
    ) {
        let name = ident.to_string();
        let reachable = module_reachable && reaches_root(vis, module.len());
        if let [file_module] = module {
            self.top_level
                .entry(name.clone())
                .or_default()
                .push(file_module.clone());
        }
        self.types
            .insert(format!("{}::{}", module.join("::"), name), reachable);
    }

    fn lookup(&self, module: &[String], name: &str) -> Option<Target> {
        let module = module.join("::");
        let reachable = *self.types.get(&format!("{module}::{name}"))?;
        Some(Target {
            module,
            type_name: name.to_string(),
            reachable,
        })
    }

    /// Resolve `ty` as written inside `module`.
    fn resolve(&self, ty: &Type, module: &[String]) -> Result<Target, String> {
        let Type::Path(path) = ty else {
            return Err("behaviour impl must name a struct, enum or union".into());
        };
        if path.qself.is_some() || path.path.leading_colon.is_some() {
            return Err("behaviour impl must name a type of this crate".into());
        }
        if path.path.segments.iter().any(|s| !s.arguments.is_none()) {
            return Err("behaviour types with generic arguments cannot be registered".into());
        }

        let segments: Vec<String> = path
            .path
            .segments
            .iter()
            .map(|s| s.ident.to_string())
            .collect();
        let written = segments.join("::");
        let unresolved = || format!("cannot find behaviour type `{written}` in the plugin sources");

        let Some((name, prefix)) = segments.split_last() else {
            return Err(unresolved());
        };

        let found = match prefix.first().map(String::as_str) {
            // `Name`: this module first, then a unique top-level declaration
            None => match self.lookup(module, name) {
                Some(target) => Some(target),
                None => match self.top_level.get(name).map(Vec::as_slice) {
                    Some([file_module]) => self.lookup(std::slice::from_ref(file_module), name),
                    Some(modules) if modules.len() > 1 => {
                        return Err(format!(
                            "behaviour type `{name}` is declared in several files ({}); use a `crate::` path",
                            modules.join(", ")
                        ));
                    }
                    _ => None,
                },
            },
            Some("crate") => self.lookup(&prefix[1..], name),
            Some("self") => self.lookup(&[module, &prefix[1..]].concat(), name),
            Some("super") => {
                let ups = prefix.iter().take_while(|s| *s == "super").count();
                match module.len().checked_sub(ups) {
                    Some(depth) if depth > 0 => {
                        self.lookup(&[&module[..depth], &prefix[ups..]].concat(), name)
                    }
                    _ => None,
                }
            }
            // Relative to this module, or through a `use` of a file module
            Some(_) => self
                .lookup(&[module, prefix].concat(), name)
                .or_else(|| self.lookup(prefix, name)),
        };

        found.ok_or_else(unresolved)
    }
}

/// Whether an item declared `depth` modules below the crate root is visible
/// from the root, where the generated entry point lives.
fn reaches_root(vis: &Visibility, depth: usize) -> bool {
    match vis {
        Visibility::Public(_) => true,
        Visibility::Restricted(r) => {
            r.path.is_ident("crate") || (r.path.is_ident("super") && depth == 1)
        }
        Visibility::Inherited => false,
    }
}

fn child(module: &[String], ident: &syn::Ident) -> Vec<String> {
    let mut path = module.to_vec();
    path.push(ident.to_string());
    path
}

// ============================================================================
// Impl discovery
// ============================================================================

fn scan_items(
    unit: &SourceUnit,
    items: &[Item],
    module: &[String],
    index: &TypeIndex,
    scan: &mut Scan,
) {
    for item in items {
        match item {
            Item::Impl(imp) => scan_impl(unit, imp, module, index, scan),
            Item::Mod(m) => {
                if let Some((_, content)) = &m.content {
                    scan_items(unit, content, &child(module, &m.ident), index, scan);
                }
            }
            _ => {}
        }
    }
}

fn scan_impl(
    unit: &SourceUnit,
    imp: &ItemImpl,
    module: &[String],
    index: &TypeIndex,
    scan: &mut Scan,
) {
    let Some((_, trait_path, _)) = &imp.trait_ else {
        return;
    };
    if trait_path
        .segments
        .last()
        .is_none_or(|seg| seg.ident != CAPABILITY_TRAIT)
    {
        return;
    }

    let location = location_of(unit, imp.self_ty.span());

    // Not a concrete type: nothing to instantiate
    if !imp.generics.params.is_empty() {
        scan.diagnostics.push(at(
            Diagnostic::warning("generic behaviour types cannot be registered; skipped"),
            &location,
        ));
        return;
    }

    match index.resolve(&imp.self_ty, module) {
        Ok(target) if target.reachable => scan.exports.push(ExportSpec {
            module: target.module,
            type_name: target.type_name,
            location,
        }),
        Ok(target) => scan.diagnostics.push(at(
            Diagnostic::error(format!(
                "behaviour type `{}::{}` must be visible from the crate root (`pub` or `pub(crate)`, in a visible module) to be loaded",
                target.module, target.type_name
            )),
            &location,
        )),
        Err(message) => scan
            .diagnostics
            .push(at(Diagnostic::error(message), &location)),
    }
}

fn location_of(unit: &SourceUnit, span: proc_macro2::Span) -> Location {
    let start = span.start();
    Location {
        file: unit.path.clone(),
        line: start.line,
        column: start.column + 1,
    }
}

fn at(diag: Diagnostic, location: &Location) -> Diagnostic {
    diag.at(location.file.clone(), location.line, location.column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn unit(module: &str, content: &str) -> SourceUnit {
        SourceUnit {
            path: PathBuf::from(format!("/b/{module}.rs")),
            module_name: module.to_string(),
            content: content.to_string(),
        }
    }

    fn paths(scan: &Scan) -> Vec<String> {
        scan.exports.iter().map(ExportSpec::path).collect()
    }

    fn errors(scan: &Scan) -> Vec<&str> {
        scan.diagnostics
            .iter()
            .filter(|d| d.is_error())
            .map(|d| d.message.as_str())
            .collect()
    }

    #[test]
    fn test_finds_public_behaviours_in_order() {
        let src = r#"
use crate::prelude::*;

#[derive(Default)]
pub struct Seek { t: f32 }

impl Behaviour for Seek {
    fn update(&mut self) {}
}

#[derive(Default)]
pub enum Mood { #[default] Calm }

impl crate::prelude::Behaviour for Mood {
    fn update(&mut self) {}
}

impl Seek {
    fn helper(&self) {}
}
"#;
        let scan = scan_sources(&[unit("seek", src)]);
        assert!(scan.diagnostics.is_empty());
        assert_eq!(paths(&scan), ["seek::Seek", "seek::Mood"]);

        let loc = &scan.exports[0].location;
        assert_eq!((loc.line, loc.column), (7, 20));
    }

    #[test]
    fn test_private_type_is_error() {
        let src = "struct Hidden;\nimpl Behaviour for Hidden { fn update(&mut self) {} }\n";
        let scan = scan_sources(&[unit("hidden", src)]);

        assert!(scan.exports.is_empty());
        assert_eq!(scan.diagnostics.len(), 1);
        assert!(scan.diagnostics[0].is_error());
        assert!(scan.diagnostics[0].message.contains("`hidden::Hidden`"));
        assert_eq!(scan.diagnostics[0].location.as_ref().unwrap().line, 2);
    }

    #[test]
    fn test_crate_visible_types_are_exported() {
        let src = r#"
pub(crate) struct Crew;
impl Behaviour for Crew { fn update(&mut self) {} }
pub(super) struct Scout;
impl Behaviour for Scout { fn update(&mut self) {} }
pub(in crate) struct Medic;
impl Behaviour for Medic { fn update(&mut self) {} }
"#;
        let scan = scan_sources(&[unit("crew", src)]);

        assert!(scan.diagnostics.is_empty(), "{:?}", scan.diagnostics);
        assert_eq!(paths(&scan), ["crew::Crew", "crew::Scout", "crew::Medic"]);
    }

    #[test]
    fn test_self_restricted_type_is_error() {
        let src = "pub(self) struct Shy;\nimpl Behaviour for Shy { fn update(&mut self) {} }\n";
        let scan = scan_sources(&[unit("shy", src)]);

        assert!(scan.exports.is_empty());
        assert_eq!(errors(&scan).len(), 1);
    }

    #[test]
    fn test_inline_modules_are_scanned() {
        let src = r#"
pub mod flock {
    use crate::prelude::*;

    #[derive(Default)]
    pub struct Boid;
    impl Behaviour for Boid { fn update(&mut self) {} }

    pub mod inner {
        #[derive(Default)]
        pub(crate) struct Leader;
        impl crate::prelude::Behaviour for Leader { fn update(&mut self) {} }
    }
}

mod hidden {
    #[derive(Default)]
    pub struct Lost;
    impl crate::prelude::Behaviour for Lost { fn update(&mut self) {} }
}
"#;
        let scan = scan_sources(&[unit("boids", src)]);

        assert_eq!(paths(&scan), ["boids::flock::Boid", "boids::flock::inner::Leader"]);
        let errs = errors(&scan);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("`boids::hidden::Lost`"));
    }

    #[test]
    fn test_pub_super_inside_nested_module_is_error() {
        let src = "pub mod m {\n    pub(super) struct Deep;\n    impl Behaviour for Deep { fn update(&mut self) {} }\n}\n";
        let scan = scan_sources(&[unit("deep", src)]);

        assert!(scan.exports.is_empty());
        assert_eq!(errors(&scan).len(), 1);
    }

    #[test]
    fn test_impl_for_type_of_another_file() {
        let scan = scan_sources(&[
            unit("a", "#[derive(Default)]\npub struct Shared;\npub struct Other;\n"),
            unit(
                "b",
                "use crate::a::Shared;\nimpl Behaviour for Shared { fn update(&mut self) {} }\nimpl Behaviour for crate::a::Other { fn update(&mut self) {} }\n",
            ),
        ]);

        assert!(scan.diagnostics.is_empty(), "{:?}", scan.diagnostics);
        assert_eq!(paths(&scan), ["a::Shared", "a::Other"]);
        assert!(scan.exports[0].location.file.ends_with("b.rs"));
    }

    #[test]
    fn test_ambiguous_name_is_error() {
        let scan = scan_sources(&[
            unit("a", "pub struct Twin;\n"),
            unit("b", "pub struct Twin;\n"),
            unit("c", "impl Behaviour for Twin { fn update(&mut self) {} }\n"),
        ]);

        assert!(scan.exports.is_empty());
        let errs = errors(&scan);
        assert_eq!(errs.len(), 1);
        assert!(errs[0].contains("several files (a, b)"));
    }

    #[test]
    fn test_unresolved_targets_are_errors() {
        let src = r#"
pub struct Wrap<T>(T);
impl<T> Behaviour for Wrap<T> { fn update(&mut self) {} }
impl Behaviour for crate::other::Thing { fn update(&mut self) {} }
impl Behaviour for Imported { fn update(&mut self) {} }
impl Behaviour for Wrap<u32> { fn update(&mut self) {} }
"#;
        let scan = scan_sources(&[unit("misc", src)]);

        assert!(scan.exports.is_empty());
        assert_eq!(scan.diagnostics.len(), 4);
        // The generic impl is skipped; the rest cannot be registered
        assert!(!scan.diagnostics[0].is_error());
        assert_eq!(errors(&scan).len(), 3);
        assert!(errors(&scan)[1].contains("`Imported`"));
    }

    #[test]
    fn test_other_traits_ignored() {
        let src = "pub struct A;\nimpl Default for A { fn default() -> Self { A } }\n";
        let scan = scan_sources(&[unit("a", src)]);
        assert!(scan.exports.is_empty());
        assert!(scan.diagnostics.is_empty());
    }

    #[test]
    fn test_unparsable_file_contributes_nothing() {
        let scan = scan_sources(&[
            unit("broken", "pub struct {"),
            unit("ok", "pub struct Ok1;\nimpl Behaviour for Ok1 { fn update(&mut self) {} }"),
        ]);
        assert_eq!(paths(&scan), ["ok::Ok1"]);
    }
}
