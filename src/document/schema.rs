//! Element and attribute classification.

use super::{ResolvedAttribute, ResolvedElement, ScalarKind, SyntaxKind, ValueKind};
use crate::base::text_utils::names_equal;

/// Classifies elements and attributes of a project document.
pub trait Schema {
    /// Classify an element by its name and its parent's kind; `None` for the root.
    ///
    /// Returning `None` leaves the element and its subtree unresolved.
    fn resolve_element(&self, parent: Option<SyntaxKind>, name: &str) -> Option<ResolvedElement>;

    /// Classify an attribute of a resolved element.
    fn resolve_attribute(
        &self,
        element: SyntaxKind,
        element_name: &str,
        attribute: &str,
    ) -> Option<ResolvedAttribute>;
}

/// The core MSBuild project vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreSchema;

const STRING_LIST: ValueKind = ValueKind::new(ScalarKind::String).list();
const FILE_LIST: ValueKind = ValueKind::new(ScalarKind::File).list();
const TARGET_LIST: ValueKind = ValueKind::new(ScalarKind::TargetName).list();
const CONDITION: ValueKind = ValueKind::new(ScalarKind::Condition);

fn element(syntax_kind: SyntaxKind) -> Option<ResolvedElement> {
    Some(ResolvedElement {
        syntax_kind,
        value_kind: None,
    })
}

fn valued_element(syntax_kind: SyntaxKind, value_kind: ValueKind) -> Option<ResolvedElement> {
    Some(ResolvedElement {
        syntax_kind,
        value_kind: Some(value_kind),
    })
}

fn attribute(value_kind: ValueKind) -> Option<ResolvedAttribute> {
    Some(ResolvedAttribute {
        syntax_kind: SyntaxKind::Other,
        value_kind,
    })
}

/// Look a name up in a case-insensitive table.
fn lookup<T: Copy>(table: &[(&str, T)], name: &str) -> Option<T> {
    table
        .iter()
        .find(|(key, _)| names_equal(key, name))
        .map(|(_, value)| *value)
}

const PROJECT_CHILDREN: &[(&str, SyntaxKind)] = &[
    ("PropertyGroup", SyntaxKind::PropertyGroup),
    ("ItemGroup", SyntaxKind::ItemGroup),
    ("ItemDefinitionGroup", SyntaxKind::ItemDefinitionGroup),
    ("Target", SyntaxKind::Target),
    ("UsingTask", SyntaxKind::UsingTask),
    ("Import", SyntaxKind::Import),
    ("Choose", SyntaxKind::Choose),
];

const WHEN_CHILDREN: &[(&str, SyntaxKind)] = &[
    ("PropertyGroup", SyntaxKind::PropertyGroup),
    ("ItemGroup", SyntaxKind::ItemGroup),
    ("Choose", SyntaxKind::Choose),
];

const CHOOSE_CHILDREN: &[(&str, SyntaxKind)] = &[
    ("When", SyntaxKind::When),
    ("Otherwise", SyntaxKind::Otherwise),
];

const TARGET_CHILDREN: &[(&str, SyntaxKind)] = &[
    ("PropertyGroup", SyntaxKind::PropertyGroup),
    ("ItemGroup", SyntaxKind::ItemGroup),
    ("OnError", SyntaxKind::OnError),
];

const PROJECT_ATTRIBUTES: &[(&str, ValueKind)] = &[
    ("DefaultTargets", TARGET_LIST),
    ("InitialTargets", TARGET_LIST),
    ("TreatAsLocalProperty", ValueKind::new(ScalarKind::PropertyName).list()),
    ("Sdk", ValueKind::new(ScalarKind::String).literal()),
    ("ToolsVersion", ValueKind::new(ScalarKind::String).literal()),
];

const ITEM_ATTRIBUTES: &[(&str, ValueKind)] = &[
    ("Include", FILE_LIST),
    ("Exclude", FILE_LIST),
    ("Remove", FILE_LIST),
    ("Update", FILE_LIST),
    ("KeepMetadata", ValueKind::new(ScalarKind::MetadataName).list()),
    ("RemoveMetadata", ValueKind::new(ScalarKind::MetadataName).list()),
    ("KeepDuplicates", ValueKind::new(ScalarKind::Bool)),
];

const TARGET_ATTRIBUTES: &[(&str, ValueKind)] = &[
    ("Name", ValueKind::new(ScalarKind::TargetName).literal()),
    ("DependsOnTargets", TARGET_LIST),
    ("BeforeTargets", TARGET_LIST),
    ("AfterTargets", TARGET_LIST),
    ("Inputs", FILE_LIST),
    ("Outputs", FILE_LIST),
    ("Returns", STRING_LIST),
    ("KeepDuplicateOutputs", ValueKind::new(ScalarKind::Bool)),
];

const TASK_ATTRIBUTES: &[(&str, ValueKind)] = &[
    ("ContinueOnError", ValueKind::new(ScalarKind::String)),
    ("Architecture", ValueKind::new(ScalarKind::String)),
    ("Runtime", ValueKind::new(ScalarKind::String)),
];

const OUTPUT_ATTRIBUTES: &[(&str, ValueKind)] = &[
    ("TaskParameter", ValueKind::new(ScalarKind::String).literal()),
    ("PropertyName", ValueKind::new(ScalarKind::PropertyName).literal()),
    ("ItemName", ValueKind::new(ScalarKind::ItemName).literal()),
];

const USING_TASK_ATTRIBUTES: &[(&str, ValueKind)] = &[
    ("TaskName", ValueKind::new(ScalarKind::TaskName).literal()),
    ("AssemblyFile", ValueKind::new(ScalarKind::File)),
    ("AssemblyName", ValueKind::new(ScalarKind::String)),
    ("TaskFactory", ValueKind::new(ScalarKind::String)),
];

const IMPORT_ATTRIBUTES: &[(&str, ValueKind)] = &[
    ("Project", ValueKind::new(ScalarKind::File)),
    ("Sdk", ValueKind::new(ScalarKind::String).literal()),
];

const ON_ERROR_ATTRIBUTES: &[(&str, ValueKind)] = &[("ExecuteTargets", TARGET_LIST)];

impl Schema for CoreSchema {
    fn resolve_element(&self, parent: Option<SyntaxKind>, name: &str) -> Option<ResolvedElement> {
        let Some(parent) = parent else {
            return names_equal(name, "Project")
                .then_some(element(SyntaxKind::Project))
                .flatten();
        };

        match parent {
            SyntaxKind::Project => element(lookup(PROJECT_CHILDREN, name)?),
            SyntaxKind::Choose => element(lookup(CHOOSE_CHILDREN, name)?),
            SyntaxKind::When | SyntaxKind::Otherwise => element(lookup(WHEN_CHILDREN, name)?),
            SyntaxKind::PropertyGroup => valued_element(SyntaxKind::Property, STRING_LIST),
            SyntaxKind::ItemGroup => element(SyntaxKind::Item),
            SyntaxKind::ItemDefinitionGroup => element(SyntaxKind::ItemDefinition),
            SyntaxKind::Item | SyntaxKind::ItemDefinition => {
                valued_element(SyntaxKind::Metadata, STRING_LIST)
            }
            SyntaxKind::Target => element(lookup(TARGET_CHILDREN, name).unwrap_or(SyntaxKind::Task)),
            SyntaxKind::Task => names_equal(name, "Output")
                .then_some(element(SyntaxKind::Output))
                .flatten(),
            SyntaxKind::UsingTask => element(SyntaxKind::Other),
            SyntaxKind::Other => {
                let kind = if names_equal(name, "Parameter") {
                    SyntaxKind::Parameter
                } else {
                    SyntaxKind::Other
                };
                element(kind)
            }
            SyntaxKind::Property
            | SyntaxKind::Metadata
            | SyntaxKind::Import
            | SyntaxKind::OnError
            | SyntaxKind::Output
            | SyntaxKind::Parameter => None,
        }
    }

    fn resolve_attribute(
        &self,
        element: SyntaxKind,
        _element_name: &str,
        name: &str,
    ) -> Option<ResolvedAttribute> {
        if names_equal(name, "Condition") {
            return attribute(CONDITION);
        }
        if names_equal(name, "Label") {
            return attribute(ValueKind::new(ScalarKind::String).literal());
        }

        let table = match element {
            SyntaxKind::Project => PROJECT_ATTRIBUTES,
            SyntaxKind::Target => TARGET_ATTRIBUTES,
            SyntaxKind::Output => OUTPUT_ATTRIBUTES,
            SyntaxKind::UsingTask => USING_TASK_ATTRIBUTES,
            SyntaxKind::Import => IMPORT_ATTRIBUTES,
            SyntaxKind::OnError => ON_ERROR_ATTRIBUTES,
            SyntaxKind::Item => {
                // Anything that is not an item operation is metadata.
                return lookup(ITEM_ATTRIBUTES, name).map_or(
                    Some(ResolvedAttribute {
                        syntax_kind: SyntaxKind::Metadata,
                        value_kind: STRING_LIST,
                    }),
                    attribute,
                );
            }
            SyntaxKind::ItemDefinition => {
                return Some(ResolvedAttribute {
                    syntax_kind: SyntaxKind::Metadata,
                    value_kind: STRING_LIST,
                });
            }
            // Task parameters are untyped here.
            SyntaxKind::Task => {
                return attribute(lookup(TASK_ATTRIBUTES, name).unwrap_or(STRING_LIST));
            }
            _ => return None,
        };
        attribute(lookup(table, name)?)
    }
}
