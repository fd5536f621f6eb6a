use crate::rule_prelude::*;

declare_check! {
    /**
    Disallow stylesheets from the theme's assets which exceed a size threshold.

    Stylesheets block rendering, every byte of them delays the first paint of the page.
    Both `stylesheet_tag` outputs and `<link rel="stylesheet">` elements referring to
    an `asset_url` are checked. Assets whose size is unknown are not reported.

    ## Incorrect Code Examples

    ```liquid
    {{ 'theme.css' | asset_url | stylesheet_tag }}
    ```

    with a `assets/theme.css` larger than the threshold.
    */
    AssetSizeCss,
    performance,
    severity(Info),
    tree(Markup),
    "AssetSizeCss",
    /// The largest size in bytes a stylesheet may have.
    pub threshold_in_bytes: u64 = 100_000
}

impl Check for AssetSizeCss {
    fn create(&self, ctx: &RunContext<'_>) -> Result<Handler, CheckError> {
        let options: AssetSizeCss = ctx.options()?;
        Ok(Handler::markup(AssetSizeCssVisitor {
            threshold_in_bytes: options.threshold_in_bytes,
        }))
    }
}

struct AssetSizeCssVisitor {
    threshold_in_bytes: u64,
}

/// The asset path of `'name' | asset_url` in an output.
fn asset_path(node: &MarkupNode) -> Option<String> {
    let variable = match node {
        MarkupNode::LiquidVariableOutput { markup, .. } => &**markup,
        _ => return None,
    };
    let name = match variable {
        MarkupNode::LiquidVariable { expression, .. } => util::string_value(expression)?,
        _ => return None,
    };

    if util::filter_names(variable).contains(&"asset_url") {
        Some(format!("assets/{}", name))
    } else {
        None
    }
}

/// The stylesheet asset a node loads.
fn stylesheet(node: &MarkupNode) -> Option<String> {
    match node {
        MarkupNode::LiquidVariableOutput { .. } if util::filter_names(node).contains(&"stylesheet_tag") => {
            asset_path(node)
        }
        MarkupNode::HtmlVoidElement { .. } if node.name()?.eq_ignore_ascii_case("link") => {
            let rel = node.attribute("rel")?.attribute_text()?;
            if !rel.eq_ignore_ascii_case("stylesheet") {
                return None;
            }
            match node.attribute("href")? {
                MarkupNode::AttrDoubleQuoted { value, .. }
                | MarkupNode::AttrSingleQuoted { value, .. }
                | MarkupNode::AttrUnquoted { value, .. } => value.iter().find_map(asset_path),
                _ => None,
            }
        }
        _ => None,
    }
}

#[async_trait(?Send)]
impl CheckVisitor<MarkupNode> for AssetSizeCssVisitor {
    fn interests(&self) -> Vec<MarkupKind> {
        vec![MarkupKind::LiquidVariableOutput, MarkupKind::HtmlVoidElement]
    }

    async fn on_node(&mut self, node: &MarkupNode, _: &[&MarkupNode], ctx: &mut RunContext<'_>) -> CheckResult {
        let path = match stylesheet(node) {
            Some(path) => path,
            None => return Ok(()),
        };

        let probe = ctx.env.probe;
        match probe.size(&path).await {
            Some(size) if size > self.threshold_in_bytes => {
                log::trace!("{} is {} bytes", path, size);
                ctx.report_span(
                    format!(
                        "CSS on every page load exceeding compressed size threshold ({} Bytes).",
                        self.threshold_in_bytes
                    ),
                    node.span(),
                );
            }
            _ => {}
        }
        Ok(())
    }
}
