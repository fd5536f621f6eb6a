use crate::rule_prelude::*;
use std::collections::HashSet;

declare_check! {
    /**
    Disallow variables which are assigned but never used.

    Unused assignments are often left behind when refactoring templates and they make
    every render do work for nothing. Variables starting with an underscore are ignored.

    ## Incorrect Code Examples

    ```liquid
    {% assign title = product.title %}
    {{ product.title }}
    ```

    ## Correct Code Examples

    ```liquid
    {% assign title = product.title %}
    {{ title }}
    ```

    ```liquid
    {% assign _unused = product.title %}
    ```
    */
    UnusedAssign,
    liquid,
    tags(Recommended),
    severity(Warning),
    tree(Markup),
    "UnusedAssign"
}

impl Check for UnusedAssign {
    fn create(&self, _: &RunContext<'_>) -> Result<Handler, CheckError> {
        Ok(Handler::markup(UnusedAssignVisitor::default()))
    }
}

#[derive(Debug, Default)]
struct UnusedAssignVisitor {
    assigns: Vec<(SmolStr, Span)>,
    used: HashSet<SmolStr>,
}

#[async_trait(?Send)]
impl CheckVisitor<MarkupNode> for UnusedAssignVisitor {
    fn interests(&self) -> Vec<MarkupKind> {
        vec![MarkupKind::AssignMarkup, MarkupKind::VariableLookup]
    }

    async fn on_node(&mut self, node: &MarkupNode, _: &[&MarkupNode], _: &mut RunContext<'_>) -> CheckResult {
        match node {
            MarkupNode::AssignMarkup { name, span, .. } if !name.starts_with('_') => {
                let name_span = Span::new(span.start, span.start + name.len() as u32);
                self.assigns.push((name.clone(), name_span));
            }
            MarkupNode::VariableLookup { name: Some(name), .. } => {
                self.used.insert(name.clone());
            }
            _ => {}
        }
        Ok(())
    }

    async fn on_end(&mut self, ctx: &mut RunContext<'_>) -> CheckResult {
        for (name, span) in &self.assigns {
            if !self.used.contains(name) {
                ctx.report_span(format!("The variable '{}' is assigned but not used", name), *span);
            }
        }
        Ok(())
    }
}
