use crate::rule_prelude::*;

declare_check! {
    /**
    Disallow scripts which block the HTML parser.

    A `<script>` with a `src` and neither `defer` nor `async` stops the parser until the
    script is downloaded and executed, delaying the first render of the page. Module
    scripts are deferred by default. The `script_tag` filter always produces a parser
    blocking script.

    ## Incorrect Code Examples

    ```html
    <script src="{{ 'theme.js' | asset_url }}"></script>
    ```

    ```liquid
    {{ 'theme.js' | asset_url | script_tag }}
    ```

    ## Correct Code Examples

    ```html
    <script src="{{ 'theme.js' | asset_url }}" defer></script>
    ```
    */
    ParserBlockingScript,
    html,
    tags(Recommended),
    severity(Error),
    tree(Markup),
    "ParserBlockingScript"
}

impl Check for ParserBlockingScript {
    fn create(&self, _: &RunContext<'_>) -> Result<Handler, CheckError> {
        Ok(Handler::markup(ParserBlockingScriptVisitor))
    }
}

struct ParserBlockingScriptVisitor;

fn is_blocking_script(node: &MarkupNode) -> bool {
    let is_script = node.name().map_or(false, |name| name.eq_ignore_ascii_case("script"));
    if !is_script || node.attribute("src").is_none() {
        return false;
    }
    if node.attribute("defer").is_some() || node.attribute("async").is_some() {
        return false;
    }

    let kind = node.attribute("type").and_then(MarkupNode::attribute_text);
    !matches!(kind, Some(kind) if kind.eq_ignore_ascii_case("module"))
}

#[async_trait(?Send)]
impl CheckVisitor<MarkupNode> for ParserBlockingScriptVisitor {
    fn interests(&self) -> Vec<MarkupKind> {
        vec![MarkupKind::HtmlRawNode, MarkupKind::LiquidVariableOutput]
    }

    async fn on_node(&mut self, node: &MarkupNode, _: &[&MarkupNode], ctx: &mut RunContext<'_>) -> CheckResult {
        let span = node.span();
        match node {
            MarkupNode::HtmlRawNode { .. } if is_blocking_script(node) => {
                ctx.report_span(
                    "Avoid parser blocking scripts by adding `defer` or `async` on this tag",
                    span,
                );
            }
            MarkupNode::LiquidVariableOutput { .. } if util::filter_names(node).contains(&"script_tag") => {
                ctx.report_span(
                    "The script_tag filter is parser-blocking. Use a script tag with the async or defer attribute for better performance",
                    span,
                );
            }
            _ => {}
        }
        Ok(())
    }
}
