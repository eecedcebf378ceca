//! Looking up documentation for `component.member` queries, as an editor
//! does when showing help for the word under the cursor.

use crate::model::{ComponentSchema, MethodDescriptor, OptionDescriptor, SchemaModel};

/// A documented member found by [`SchemaModel::search`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit<'a> {
    pub component: &'a ComponentSchema,
    pub member: Member<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Member<'a> {
    Option(&'a OptionDescriptor),
    Event(&'a OptionDescriptor),
    Method(&'a MethodDescriptor),
    Field(&'a OptionDescriptor),
}

impl Member<'_> {
    pub fn name(&self) -> &str {
        match self {
            Member::Option(o) | Member::Event(o) | Member::Field(o) => &o.name,
            Member::Method(m) => &m.name,
        }
    }

    /// `config`, `event`, `method` or `field`.
    pub fn kind(&self) -> &'static str {
        match self {
            Member::Option(_) => "config",
            Member::Event(_) => "event",
            Member::Method(_) => "method",
            Member::Field(_) => "field",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("Expected a query like `grid.columns`, got `{0}`")]
    MalformedQuery(String),
    #[error("Component not found: {0}")]
    ComponentNotFound(String),
    #[error("Property {member} not found in {component}")]
    MemberNotFound { member: String, component: String },
}

impl SchemaModel {
    /// Find `component.member`, both parts case-insensitive. The component
    /// matches by id suffix; the member is looked up among options, events,
    /// methods and fields, in that order.
    pub fn search(&self, query: &str) -> Result<SearchHit<'_>, SearchError> {
        let Some((component, member)) = query.split_once('.') else {
            return Err(SearchError::MalformedQuery(query.to_string()));
        };
        if component.is_empty() || member.is_empty() {
            return Err(SearchError::MalformedQuery(query.to_string()));
        }

        let component = self
            .find_by_suffix_ci(component)
            .ok_or_else(|| SearchError::ComponentNotFound(component.to_string()))?;
        let wanted = member.to_lowercase();
        let named = |name: &str| name.to_lowercase() == wanted;

        let member = find_last(&component.options, &named)
            .map(Member::Option)
            .or_else(|| find_last(&component.events, &named).map(Member::Event))
            .or_else(|| {
                component
                    .methods
                    .iter()
                    .rev()
                    .find(|m| named(&m.name))
                    .map(Member::Method)
            })
            .or_else(|| find_last(&component.fields, &named).map(Member::Field))
            .ok_or_else(|| SearchError::MemberNotFound {
                member: wanted.clone(),
                component: component.name.clone(),
            })?;

        Ok(SearchHit { component, member })
    }
}

/// The last documented entry wins when a name repeats.
fn find_last<'a>(
    list: &'a [OptionDescriptor],
    named: &impl Fn(&str) -> bool,
) -> Option<&'a OptionDescriptor> {
    list.iter().rev().find(|o| named(&o.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn schema() -> SchemaModel {
        SchemaModel::builder()
            .component(
                ComponentSchema::new("kendo.ui.Grid")
                    .with_option(OptionDescriptor::new("columns", &["Array"]))
                    .with_event("dataBound")
                    .with_method(MethodDescriptor::new("refresh", Vec::new()))
                    .with_field(OptionDescriptor::new("table", &["jQuery"])),
            )
            .build()
            .unwrap()
    }

    fn find(query: &str) -> Result<(String, &'static str), SearchError> {
        let schema = schema();
        let hit = schema.search(query)?;
        Ok((hit.member.name().to_string(), hit.member.kind()))
    }

    #[test]
    fn test_member_kinds() {
        assert_eq!(find("grid.columns"), Ok(("columns".to_string(), "config")));
        assert_eq!(find("Grid.DATABOUND"), Ok(("dataBound".to_string(), "event")));
        assert_eq!(find("grid.refresh"), Ok(("refresh".to_string(), "method")));
        assert_eq!(find("grid.table"), Ok(("table".to_string(), "field")));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            find("chart.series"),
            Err(SearchError::ComponentNotFound("chart".to_string()))
        );
        assert_eq!(
            find("grid.rows").unwrap_err().to_string(),
            "Property rows not found in kendo.ui.Grid"
        );
        assert_eq!(
            find("grid"),
            Err(SearchError::MalformedQuery("grid".to_string()))
        );
        assert_eq!(
            find("grid."),
            Err(SearchError::MalformedQuery("grid.".to_string()))
        );
    }
}
