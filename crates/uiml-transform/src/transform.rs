//! Main transformation logic.
//!
//! Walks the markup tree into [`ComponentDef`]s. Semantic errors abort the
//! walk; script parse errors are re-anchored into the document and collected
//! while the walk continues.

use crate::component::{
    CollectedDeclarations, ComponentDef, ComponentOrCompound, CompoundComponentDef, EventHandler, PropValue,
};
use crate::diagnostic::Diagnostic;
use crate::embedded::EmbeddedText;
use crate::error::TransformError;
use crate::namespace::NamespaceStack;
use crate::script;
use crate::CompileOptions;
use indexmap::IndexMap;
use smol_str::SmolStr;
use source_map::{LineIndex, Span};
use uiml_markup::{Attribute, Content, Document, Element, SyntaxToken};
use uiml_script::ParseError;

type TResult<T> = Result<T, TransformError>;

/// Name of the element that defines a reusable component.
const COMPOUND_TAG: &str = "Component";
/// Type of the implicit wrapper around several children.
const FRAGMENT: &str = "Fragment";

/// Reserved lowercase elements that configure their parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Helper {
    Property,
    Template,
    Event,
    Variable,
    Loaders,
    Uses,
    Method,
    Item,
    Field,
}

impl Helper {
    fn from_name(name: &str) -> Option<Self> {
        let helper = match name {
            "property" => Helper::Property,
            "template" => Helper::Template,
            "event" => Helper::Event,
            "variable" => Helper::Variable,
            "loaders" => Helper::Loaders,
            "uses" => Helper::Uses,
            "method" => Helper::Method,
            "item" => Helper::Item,
            "field" => Helper::Field,
            _ => return None,
        };
        Some(helper)
    }

    fn name(self) -> SmolStr {
        let name = match self {
            Helper::Property => "property",
            Helper::Template => "template",
            Helper::Event => "event",
            Helper::Variable => "variable",
            Helper::Loaders => "loaders",
            Helper::Uses => "uses",
            Helper::Method => "method",
            Helper::Item => "item",
            Helper::Field => "field",
        };
        SmolStr::new_static(name)
    }
}

/// What an element stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Script,
    Compound,
    Helper(Helper),
    Component,
}

fn role(element: &Element) -> Role {
    let Some(tag) = element.tag_name() else {
        return Role::Component;
    };
    if tag.namespace().is_some() {
        return Role::Component;
    }
    let local = tag.local_name();
    if local == "script" {
        Role::Script
    } else if local == COMPOUND_TAG {
        Role::Compound
    } else {
        Helper::from_name(&local).map_or(Role::Component, Role::Helper)
    }
}

/// An attribute with its value extracted.
struct AttributeData {
    prefix: Option<SmolStr>,
    local: SmolStr,
    full: SmolStr,
    value: EmbeddedText,
    span: Span,
}

impl AttributeData {
    fn from_attribute(attribute: &Attribute) -> Option<Self> {
        let key = attribute.key()?;
        let value = match attribute.value().and_then(|value| value.inner()) {
            Some((raw, start)) => EmbeddedText::attribute(&raw, start),
            // Key-only attributes mean "true".
            None => EmbeddedText::attribute("true", u32::from(key.name_span().start)),
        };
        Some(Self {
            prefix: key.namespace(),
            local: key.local_name(),
            full: key.full_name(),
            value,
            span: attribute.span(),
        })
    }

    fn is_namespace_declaration(&self) -> bool {
        self.full == "xmlns" || self.prefix.as_deref() == Some("xmlns")
    }
}

fn attributes(element: &Element) -> Vec<AttributeData> {
    element.attributes().filter_map(|a| AttributeData::from_attribute(&a)).collect()
}

/// The content of a CDATA section and its document offset.
fn cdata_inner(token: &SyntaxToken) -> (&str, u32) {
    const OPEN: &str = "<![CDATA[";
    let text = token.text();
    let (inner, start) = match text.strip_prefix(OPEN) {
        Some(inner) => (inner, token_start(token) + OPEN.len() as u32),
        None => (text, token_start(token)),
    };
    (inner.strip_suffix("]]>").unwrap_or(inner), start)
}

fn token_start(token: &SyntaxToken) -> u32 {
    u32::from(token.text_range().start())
}

/// `onClick` names the `click` event.
fn event_attribute(name: &str) -> Option<SmolStr> {
    let rest = name.strip_prefix("on")?;
    let first = rest.chars().next()?;
    if !first.is_uppercase() {
        return None;
    }
    let mut event = first.to_lowercase().to_string();
    event.push_str(&rest[first.len_utf8()..]);
    Some(SmolStr::new(event))
}

fn wrap_in_fragment(children: Vec<ComponentDef>, span: Span) -> ComponentDef {
    let mut fragment = ComponentDef::new(FRAGMENT, span);
    fragment.children = children;
    fragment
}

/// Content of a helper element, sorted by kind.
#[derive(Default)]
struct HelperContent {
    text: EmbeddedText,
    text_span: Option<Span>,
    components: Vec<ComponentDef>,
    items: Vec<PropValue>,
    fields: IndexMap<SmolStr, PropValue>,
}

pub(crate) struct Transformer<'a> {
    line_index: LineIndex,
    options: &'a CompileOptions,
    namespaces: NamespaceStack,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Transformer<'a> {
    pub(crate) fn new(source: &str, options: &'a CompileOptions) -> Self {
        Self {
            line_index: LineIndex::new(source),
            options,
            namespaces: NamespaceStack::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Transforms the document. Returns the component, if the walk got
    /// through, and every diagnostic raised on the way.
    pub(crate) fn run(mut self, document: &Document) -> (Option<ComponentOrCompound>, Vec<Diagnostic>) {
        let result = self.document(document);
        let mut diagnostics = self.diagnostics;
        match result {
            Ok(component) => (Some(component), diagnostics),
            Err(error) => {
                log::debug!("transform aborted: {error}");
                diagnostics.push(error.into());
                (None, diagnostics)
            }
        }
    }

    fn document(&mut self, document: &Document) -> TResult<ComponentOrCompound> {
        let roots: Vec<Element> = document.root_elements().collect();
        let root = match roots.as_slice() {
            [root] => root,
            [] => {
                return Err(TransformError::RootCount {
                    span: Span::empty(document.span().end),
                })
            }
            [_, second, ..] => {
                return Err(TransformError::RootCount {
                    span: second.open_span(),
                })
            }
        };
        match role(root) {
            Role::Compound => Ok(ComponentOrCompound::Compound(self.compound(root)?)),
            _ => Ok(ComponentOrCompound::Component(self.component(root)?)),
        }
    }

    // === Scripts ===

    fn script_error(&mut self, error: ParseError, text: &EmbeddedText) -> ParseError {
        let error = text.reanchor(error, &self.line_index);
        log::debug!("script error at {:?}: {}", error.span, error);
        self.diagnostics.push(TransformError::Script(error.clone()).into());
        error
    }

    fn prop_value(&mut self, text: EmbeddedText) -> PropValue {
        match script::property_value(text.as_str(), &self.options.ids, self.options.simplify) {
            Ok(value) => value,
            Err(error) => {
                self.script_error(error, &text);
                PropValue::Literal(text.into_string())
            }
        }
    }

    fn event_handler(&mut self, text: EmbeddedText, span: Span) -> EventHandler {
        let parsed = if self.options.parse_events {
            match script::handler(text.as_str(), &self.options.ids, self.options.simplify) {
                Ok(handler) => Some(handler),
                Err(error) => {
                    self.script_error(error, &text);
                    None
                }
            }
        } else {
            None
        };
        EventHandler {
            source: text.into_string(),
            parsed,
            span,
        }
    }

    /// Reads the `<script>` element of a component.
    fn code_behind(&mut self, element: &Element, target: &mut ScriptTarget<'_>) {
        let mut text = EmbeddedText::new();
        for item in element.children() {
            if let Content::Script(token) = item {
                text.push_verbatim(token.text(), token_start(&token));
            }
        }
        match script::code_behind(text.as_str(), &self.options.ids) {
            Ok(collected) => *target.collected = Some(collected),
            Err(error) => *target.error = Some(self.script_error(error, &text)),
        }
        *target.script = Some(text.into_string());
    }

    // === Namespaces and attributes ===

    fn declare_namespaces(&mut self, attributes: &[AttributeData]) -> TResult<()> {
        for attribute in attributes.iter().filter(|a| a.is_namespace_declaration()) {
            let prefix = if attribute.prefix.is_some() {
                attribute.local.as_str()
            } else {
                ""
            };
            if !self.namespaces.declare(prefix, attribute.value.as_str()) {
                return Err(TransformError::InvalidNamespace {
                    name: attribute.full.clone(),
                    span: attribute.span,
                });
            }
        }
        Ok(())
    }

    fn type_name(&self, element: &Element) -> TResult<SmolStr> {
        let span = element.open_span();
        let tag = element.tag_name().ok_or_else(|| TransformError::InvalidNamespace {
            name: SmolStr::default(),
            span,
        })?;
        let prefix = tag.namespace();
        self.namespaces
            .type_name(prefix.as_deref(), &tag.local_name())
            .ok_or_else(|| TransformError::InvalidNamespace {
                name: prefix.unwrap_or_default(),
                span,
            })
    }

    fn apply_attribute(&mut self, component: &mut ComponentDef, attribute: AttributeData) -> TResult<()> {
        let invalid = || TransformError::InvalidAttributeName {
            name: attribute.full.clone(),
            span: attribute.span,
        };
        if attribute.prefix.is_some() {
            return Err(invalid());
        }
        let segments: Vec<&str> = attribute.local.split('.').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(invalid());
        }

        match segments.as_slice() {
            ["id"] => component.uid = Some(SmolStr::new(attribute.value.as_str())),
            ["when"] => component.when = Some(self.prop_value(attribute.value)),
            ["testId"] => component.test_id = Some(self.prop_value(attribute.value)),
            [name] => match event_attribute(name) {
                Some(event) => {
                    let handler = self.event_handler(attribute.value, attribute.span);
                    component.events.insert(event, handler);
                }
                None => {
                    let value = self.prop_value(attribute.value);
                    component.props.insert(SmolStr::new(name), value);
                }
            },
            ["var", name] => {
                let name = SmolStr::new(name);
                let value = self.prop_value(attribute.value);
                component.vars.insert(name, value);
            }
            ["method", name] => {
                let name = SmolStr::new(name);
                let handler = self.event_handler(attribute.value, attribute.span);
                component.api.insert(name, handler);
            }
            ["event", name] => {
                let name = SmolStr::new(name);
                let handler = self.event_handler(attribute.value, attribute.span);
                component.events.insert(name, handler);
            }
            _ => return Err(invalid()),
        }
        Ok(())
    }

    // === Components ===

    fn component(&mut self, element: &Element) -> TResult<ComponentDef> {
        self.namespaces.push();
        let result = self.component_in_scope(element);
        self.namespaces.pop();
        result
    }

    fn component_in_scope(&mut self, element: &Element) -> TResult<ComponentDef> {
        let attributes = attributes(element);
        self.declare_namespaces(&attributes)?;
        let type_name = self.type_name(element)?;
        log::trace!("transforming <{type_name}>");

        let mut component = ComponentDef::new(type_name, element.span());
        for attribute in attributes {
            if !attribute.is_namespace_declaration() {
                self.apply_attribute(&mut component, attribute)?;
            }
        }

        let mut text = EmbeddedText::new();
        let mut text_span = None;
        let mut script: Option<Element> = None;
        for item in element.children() {
            match item {
                Content::Text(token) | Content::Entity(token) => {
                    text_span.get_or_insert(item_span(&token));
                    text.push_unescaped(token.text(), token_start(&token), true);
                }
                Content::CData(token) => {
                    text_span.get_or_insert(item_span(&token));
                    let (inner, start) = cdata_inner(&token);
                    text.push_verbatim(inner, start);
                }
                Content::Script(_) => {}
                Content::Element(child) => match role(&child) {
                    Role::Script if script.is_some() => {
                        return Err(TransformError::MultipleScripts {
                            span: child.open_span(),
                        })
                    }
                    Role::Script => script = Some(child),
                    Role::Compound => {
                        return Err(TransformError::NestedCompound {
                            span: child.open_span(),
                        })
                    }
                    Role::Helper(helper) => self.apply_helper(&mut component, helper, &child)?,
                    Role::Component => {
                        let child = self.component(&child)?;
                        component.children.push(child);
                    }
                },
            }
        }

        if !text.is_empty() {
            if !component.children.is_empty() {
                return Err(TransformError::MixedContent {
                    element: component.type_name.clone(),
                    span: text_span.unwrap_or(component.span),
                });
            }
            if !component.props.contains_key("value") {
                let value = self.prop_value(text);
                component.props.insert(SmolStr::new_static("value"), value);
            }
        }

        if let Some(script) = script {
            let mut target = ScriptTarget {
                script: &mut component.script,
                collected: &mut component.script_collected,
                error: &mut component.script_error,
            };
            self.code_behind(&script, &mut target);
        }
        Ok(component)
    }

    fn apply_helper(&mut self, component: &mut ComponentDef, helper: Helper, element: &Element) -> TResult<()> {
        match helper {
            Helper::Property => {
                let name = self.helper_name(helper, element)?;
                let value = self.helper_value(helper, element)?;
                component.props.insert(name, value);
            }
            Helper::Template => {
                let name = self.helper_name(helper, element)?;
                let content = self.helper_content(helper, element, false)?;
                let value = match content.components.len() {
                    0 => {
                        return Err(TransformError::ValueRequired {
                            helper: helper.name(),
                            span: element.open_span(),
                        })
                    }
                    1 => content.components.into_iter().next().unwrap_or_default(),
                    _ => wrap_in_fragment(content.components, element.span()),
                };
                component.props.insert(name, PropValue::Component(Box::new(value)));
            }
            Helper::Event => {
                let name = self.helper_name(helper, element)?;
                let handler = self.helper_handler(helper, element)?;
                component.events.insert(name, handler);
            }
            Helper::Variable => {
                let name = self.helper_name(helper, element)?;
                let value = self.helper_value(helper, element)?;
                component.vars.insert(name, value);
            }
            Helper::Method => {
                let name = self.helper_name(helper, element)?;
                let handler = self.helper_handler(helper, element)?;
                component.api.insert(name, handler);
            }
            Helper::Loaders => {
                let content = self.helper_content(helper, element, false)?;
                component.loaders.extend(content.components);
            }
            Helper::Uses => {
                let uses = self.uses(element)?;
                component.uses.extend(uses);
            }
            Helper::Item | Helper::Field => {
                return Err(TransformError::MisplacedHelper {
                    helper: helper.name(),
                    span: element.open_span(),
                })
            }
        }
        Ok(())
    }

    fn helper_name(&self, helper: Helper, element: &Element) -> TResult<SmolStr> {
        element
            .attribute("name")
            .and_then(|attribute| attribute.value())
            .and_then(|value| value.value())
            .filter(|name| !name.trim().is_empty())
            .map(|name| SmolStr::new(name.trim()))
            .ok_or_else(|| TransformError::NameRequired {
                helper: helper.name(),
                span: element.open_span(),
            })
    }

    fn value_attribute(element: &Element) -> Option<EmbeddedText> {
        let (raw, start) = element.attribute("value")?.value()?.inner()?;
        Some(EmbeddedText::attribute(&raw, start))
    }

    /// Sorts the content of a helper. `in_property` allows `<item>` and
    /// `<field>` children.
    fn helper_content(&mut self, helper: Helper, element: &Element, in_property: bool) -> TResult<HelperContent> {
        let mut content = HelperContent::default();
        for item in element.children() {
            match item {
                Content::Text(token) | Content::Entity(token) => {
                    content.text_span.get_or_insert(item_span(&token));
                    content.text.push_unescaped(token.text(), token_start(&token), false);
                }
                Content::CData(token) => {
                    content.text_span.get_or_insert(item_span(&token));
                    let (inner, start) = cdata_inner(&token);
                    content.text.push_verbatim(inner, start);
                }
                Content::Script(_) => {}
                Content::Element(child) => match role(&child) {
                    Role::Helper(Helper::Item) if in_property => {
                        let value = self.helper_value(Helper::Item, &child)?;
                        content.items.push(value);
                    }
                    Role::Helper(Helper::Field) if in_property => {
                        let name = self.helper_name(Helper::Field, &child)?;
                        let value = self.helper_value(Helper::Field, &child)?;
                        content.fields.insert(name, value);
                    }
                    Role::Helper(other) => {
                        return Err(TransformError::MisplacedHelper {
                            helper: other.name(),
                            span: child.open_span(),
                        })
                    }
                    Role::Compound => {
                        return Err(TransformError::NestedCompound {
                            span: child.open_span(),
                        })
                    }
                    Role::Script => log::debug!("ignoring <script> inside <{}>", helper.name()),
                    Role::Component => {
                        let child = self.component(&child)?;
                        content.components.push(child);
                    }
                },
            }
        }
        content.text.trim();

        let kinds = [
            !content.text.is_empty(),
            !content.components.is_empty(),
            !content.items.is_empty(),
            !content.fields.is_empty(),
        ];
        if kinds.iter().filter(|present| **present).count() > 1 {
            return Err(TransformError::MixedContent {
                element: helper.name(),
                span: content.text_span.unwrap_or_else(|| element.open_span()),
            });
        }
        Ok(content)
    }

    /// The value of `<property>`, `<variable>`, `<item>` or `<field>`.
    fn helper_value(&mut self, helper: Helper, element: &Element) -> TResult<PropValue> {
        if let Some(text) = Self::value_attribute(element) {
            return Ok(self.prop_value(text));
        }
        let in_property = matches!(helper, Helper::Property | Helper::Item | Helper::Field);
        let mut content = self.helper_content(helper, element, in_property)?;
        if !content.items.is_empty() {
            return Ok(PropValue::List(content.items));
        }
        if !content.fields.is_empty() {
            return Ok(PropValue::Object(content.fields));
        }
        match content.components.len() {
            0 => {}
            1 => {
                let component = content.components.pop().unwrap_or_default();
                return Ok(PropValue::Component(Box::new(component)));
            }
            _ => {
                let fragment = wrap_in_fragment(content.components, element.span());
                return Ok(PropValue::Component(Box::new(fragment)));
            }
        }
        if content.text.is_empty() {
            return Err(TransformError::ValueRequired {
                helper: helper.name(),
                span: element.open_span(),
            });
        }
        Ok(self.prop_value(content.text))
    }

    /// The handler of `<event>` or `<method>`: the `value` attribute or the
    /// text content.
    fn helper_handler(&mut self, helper: Helper, element: &Element) -> TResult<EventHandler> {
        let text = match Self::value_attribute(element) {
            Some(text) => text,
            None => {
                let content = self.helper_content(helper, element, false)?;
                if !content.components.is_empty() {
                    return Err(TransformError::MixedContent {
                        element: helper.name(),
                        span: element.open_span(),
                    });
                }
                content.text
            }
        };
        if text.as_str().trim().is_empty() {
            return Err(TransformError::ValueRequired {
                helper: helper.name(),
                span: element.open_span(),
            });
        }
        Ok(self.event_handler(text, element.span()))
    }

    fn uses(&self, element: &Element) -> TResult<Vec<SmolStr>> {
        let value = element
            .attribute("value")
            .and_then(|attribute| attribute.value())
            .and_then(|value| value.value())
            .ok_or_else(|| TransformError::ValueRequired {
                helper: Helper::Uses.name(),
                span: element.open_span(),
            })?;
        let names: Vec<&str> = value.split(',').map(str::trim).collect();
        let valid = names.iter().all(|name| {
            name.starts_with(|c: char| c.is_alphabetic() || c == '_' || c == '$')
                && name.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '.'))
        });
        if !valid {
            return Err(TransformError::InvalidUses {
                value: value.clone(),
                span: element.open_span(),
            });
        }
        Ok(names.into_iter().map(SmolStr::new).collect())
    }

    // === Reusable components ===

    fn compound(&mut self, element: &Element) -> TResult<CompoundComponentDef> {
        self.namespaces.push();
        let result = self.compound_in_scope(element);
        self.namespaces.pop();
        result
    }

    fn compound_in_scope(&mut self, element: &Element) -> TResult<CompoundComponentDef> {
        let attributes = attributes(element);
        self.declare_namespaces(&attributes)?;

        let mut name: Option<(SmolStr, Span)> = None;
        let mut vars = IndexMap::new();
        let mut api = IndexMap::new();
        for attribute in attributes {
            if attribute.is_namespace_declaration() {
                continue;
            }
            let segments: Vec<&str> = attribute.local.split('.').collect();
            match (attribute.prefix.is_none(), segments.as_slice()) {
                (true, ["name"]) => {
                    name = Some((SmolStr::new(attribute.value.as_str().trim()), attribute.span));
                }
                (true, ["var", var]) if !var.is_empty() => {
                    let var = SmolStr::new(var);
                    let value = self.prop_value(attribute.value);
                    vars.insert(var, value);
                }
                (true, ["method", method]) if !method.is_empty() => {
                    let method = SmolStr::new(method);
                    let handler = self.event_handler(attribute.value, attribute.span);
                    api.insert(method, handler);
                }
                _ => {
                    return Err(TransformError::InvalidAttributeName {
                        name: attribute.full,
                        span: attribute.span,
                    })
                }
            }
        }

        let (name, name_span) = match name {
            Some((name, span)) if !name.is_empty() => (name, span),
            _ => {
                return Err(TransformError::NameRequired {
                    helper: SmolStr::new_static(COMPOUND_TAG),
                    span: element.open_span(),
                })
            }
        };
        if !name.starts_with(|c: char| c.is_uppercase()) {
            return Err(TransformError::CompoundNameCase { name, span: name_span });
        }
        log::trace!("transforming component definition {name}");

        let mut body = Vec::new();
        let mut script: Option<Element> = None;
        let mut compound = CompoundComponentDef {
            name,
            component: Box::default(),
            api,
            vars,
            script: None,
            script_collected: None,
            script_error: None,
            span: element.span(),
        };
        for item in element.children() {
            match item {
                Content::Element(child) => match role(&child) {
                    Role::Script if script.is_some() => {
                        return Err(TransformError::MultipleScripts {
                            span: child.open_span(),
                        })
                    }
                    Role::Script => script = Some(child),
                    Role::Compound => {
                        return Err(TransformError::NestedCompound {
                            span: child.open_span(),
                        })
                    }
                    Role::Helper(Helper::Variable) => {
                        let var = self.helper_name(Helper::Variable, &child)?;
                        let value = self.helper_value(Helper::Variable, &child)?;
                        compound.vars.insert(var, value);
                    }
                    Role::Helper(Helper::Method) => {
                        let method = self.helper_name(Helper::Method, &child)?;
                        let handler = self.helper_handler(Helper::Method, &child)?;
                        compound.api.insert(method, handler);
                    }
                    Role::Helper(other) => {
                        return Err(TransformError::MisplacedHelper {
                            helper: other.name(),
                            span: child.open_span(),
                        })
                    }
                    Role::Component => body.push(self.component(&child)?),
                },
                Content::Text(token) | Content::CData(token) | Content::Entity(token) => {
                    if !token.text().trim().is_empty() {
                        return Err(TransformError::MixedContent {
                            element: SmolStr::new_static(COMPOUND_TAG),
                            span: item_span(&token),
                        });
                    }
                }
                Content::Script(_) => {}
            }
        }

        if body.is_empty() {
            return Err(TransformError::CompoundWithoutChild {
                name: compound.name,
                span: element.open_span(),
            });
        }
        let component = if body.len() > 1 || !compound.vars.is_empty() {
            let mut fragment = wrap_in_fragment(body, element.span());
            fragment.vars = compound.vars.clone();
            fragment
        } else {
            body.pop().unwrap_or_default()
        };
        compound.component = Box::new(component);

        if let Some(script) = script {
            let mut target = ScriptTarget {
                script: &mut compound.script,
                collected: &mut compound.script_collected,
                error: &mut compound.script_error,
            };
            self.code_behind(&script, &mut target);
        }
        Ok(compound)
    }
}

/// Where the results of a `<script>` element go.
struct ScriptTarget<'c> {
    script: &'c mut Option<String>,
    collected: &'c mut Option<CollectedDeclarations>,
    error: &'c mut Option<ParseError>,
}

fn item_span(token: &SyntaxToken) -> Span {
    token.text_range().into()
}
