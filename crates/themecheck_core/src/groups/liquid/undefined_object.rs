use crate::rule_prelude::*;
use std::mem;

declare_check! {
    /**
    Disallow references to objects which are not defined.

    An object is defined if it is a global object of the theme, if it was assigned,
    captured or incremented before the reference, or if the reference is in the body of
    a tag binding it, such as the variable of a `for` loop. Sections may always refer to
    `section` and theme blocks to `block`.

    Snippets are not checked since the objects they use are passed by their callers.

    ## Incorrect Code Examples

    ```liquid
    {{ produt.title }}
    ```

    ```liquid
    {% for item in cart.items %}{% endfor %}
    {{ item.title }}
    ```

    ## Correct Code Examples

    ```liquid
    {% assign title = product.title %}
    {{ title }}
    ```
    */
    UndefinedObject,
    liquid,
    tags(Recommended),
    severity(Warning),
    tree(Markup),
    "UndefinedObject"
}

impl Check for UndefinedObject {
    fn create(&self, ctx: &RunContext<'_>) -> Result<Handler, CheckError> {
        let path = ctx.relative_path();
        if path.starts_with("snippets/") {
            return Ok(Handler::Inapplicable);
        }

        let mut scopes = ScopeCollector::new();
        for global in ctx.env.docset.globals() {
            scopes.define_global(global);
        }
        if path.starts_with("sections/") {
            scopes.define_global("section");
        }
        if path.starts_with("blocks/") {
            scopes.define_global("block");
        }

        Ok(Handler::markup(UndefinedObjectVisitor {
            scopes,
            references: vec![],
        }))
    }
}

#[derive(Debug)]
struct UndefinedObjectVisitor {
    scopes: ScopeCollector,
    /// Referenced names with the span of the name.
    references: Vec<(SmolStr, Span)>,
}

impl UndefinedObjectVisitor {
    fn bind(&mut self, tag: &MarkupNode) {
        let (name, markup, markup_text, span, children, block_start, block_end) = match tag {
            MarkupNode::LiquidTag {
                name,
                markup,
                markup_text,
                span,
                children,
                block_start,
                block_end,
            } => (name, markup, markup_text, span, children, block_start, block_end),
            _ => return,
        };
        let body = block_end.map(|end| ScopeRange::new(block_start.end, end.start));

        match name.as_str() {
            "assign" => {
                for node in markup {
                    if let MarkupNode::AssignMarkup { name, .. } = node {
                        self.scopes.define(name.clone(), ScopeRange::open(span.end));
                    }
                }
            }
            "capture" | "increment" | "decrement" => {
                if let Some(variable) = util::first_word(markup_text) {
                    self.scopes.define(variable, ScopeRange::open(span.end));
                }
            }
            "for" | "tablerow" => {
                // the `else` branch runs when there is nothing to loop over
                let loop_end = children.iter().flatten().find_map(|child| match child {
                    MarkupNode::LiquidBranch { name: None, span, .. } => Some(span.end),
                    _ => None,
                });
                let body = match (body, loop_end) {
                    (Some(body), Some(end)) => ScopeRange::new(body.start, end),
                    (Some(body), None) => body,
                    (None, _) => return,
                };
                for node in markup {
                    if let MarkupNode::ForMarkup { variable_name, .. } = node {
                        self.scopes.define(variable_name.clone(), body);
                    }
                }
                let helper = if name == "for" { "forloop" } else { "tablerowloop" };
                self.scopes.define(helper, body);
            }
            "paginate" | "form" => {
                if let Some(body) = body {
                    self.scopes.define(name.clone(), body);
                }
            }
            _ => {}
        }
    }
}

#[async_trait(?Send)]
impl CheckVisitor<MarkupNode> for UndefinedObjectVisitor {
    fn interests(&self) -> Vec<MarkupKind> {
        vec![MarkupKind::LiquidTag, MarkupKind::VariableLookup]
    }

    async fn on_node(&mut self, node: &MarkupNode, lineage: &[&MarkupNode], _: &mut RunContext<'_>) -> CheckResult {
        match node {
            MarkupNode::LiquidTag { .. } => self.bind(node),
            // `layout none` names a layout, not an object
            MarkupNode::VariableLookup {
                name: Some(name),
                span,
                ..
            } if util::enclosing_tag(lineage, &["layout"]).is_none() => {
                let name_span = Span::new(span.start, span.start + name.len() as u32);
                self.references.push((name.clone(), name_span));
            }
            _ => {}
        }
        Ok(())
    }

    async fn on_end(&mut self, ctx: &mut RunContext<'_>) -> CheckResult {
        let index = mem::take(&mut self.scopes).finish();
        for (name, span) in self.references.drain(..) {
            if !index.is_defined(&name, span.start) {
                ctx.report_span(format!("Unknown object '{}' used.", name), span);
            }
        }
        Ok(())
    }
}
