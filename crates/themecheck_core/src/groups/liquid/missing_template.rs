use crate::rule_prelude::*;

declare_check! {
    /**
    Disallow rendering snippets and sections which do not exist in the theme.

    `render` and `include` look up `snippets/<name>.liquid`, `section` looks up
    `sections/<name>.liquid`. Templates named by a variable are not checked.

    ## Incorrect Code Examples

    ```liquid
    {% render 'product-crad' %}
    ```

    ## Config

    `ignore_missing` accepts paths relative to the theme root which are never reported.
    A pattern ending with `*` matches every path starting with the rest of it.
    */
    MissingTemplate,
    liquid,
    tags(Recommended),
    severity(Error),
    tree(Markup),
    "MissingTemplate",
    /// Paths of templates which may be missing, such as `snippets/icon-*`.
    pub ignore_missing: Vec<String> = vec![]
}

impl Check for MissingTemplate {
    fn create(&self, ctx: &RunContext<'_>) -> Result<Handler, CheckError> {
        let options: MissingTemplate = ctx.options()?;
        Ok(Handler::markup(MissingTemplateVisitor {
            ignore_missing: options.ignore_missing,
        }))
    }
}

#[derive(Debug)]
struct MissingTemplateVisitor {
    ignore_missing: Vec<String>,
}

impl MissingTemplateVisitor {
    fn is_ignored(&self, path: &str) -> bool {
        self.ignore_missing.iter().any(|pattern| match pattern.strip_suffix('*') {
            Some(prefix) => path.starts_with(prefix),
            None => path == pattern,
        })
    }
}

/// The template a tag refers to along with the node naming it.
fn template_of(name: &str, markup: &[MarkupNode]) -> Option<(String, Span)> {
    let (dir, node) = match (name, markup.first()?) {
        ("render" | "include", MarkupNode::RenderMarkup { snippet, .. }) => ("snippets", &**snippet),
        ("section", node) => ("sections", node),
        _ => return None,
    };

    match node {
        MarkupNode::String { value, span } => Some((format!("{}/{}.liquid", dir, value), *span)),
        _ => None,
    }
}

#[async_trait(?Send)]
impl CheckVisitor<MarkupNode> for MissingTemplateVisitor {
    fn interests(&self) -> Vec<MarkupKind> {
        vec![MarkupKind::LiquidTag]
    }

    async fn on_node(&mut self, node: &MarkupNode, _: &[&MarkupNode], ctx: &mut RunContext<'_>) -> CheckResult {
        let (path, span) = match node {
            MarkupNode::LiquidTag { name, markup, .. } => match template_of(name, markup) {
                Some(template) => template,
                None => return Ok(()),
            },
            _ => return Ok(()),
        };
        if self.is_ignored(&path) {
            return Ok(());
        }

        let probe = ctx.env.probe;
        if !probe.exists(&path).await {
            ctx.report_span(format!("'{}' does not exist", path), span);
        }
        Ok(())
    }
}
