use crate::rule_prelude::*;
use std::collections::HashSet;

declare_check! {
    /**
    Disallow duplicate keys in JSON objects.

    Parsers keep only one of the values of a repeated key, usually the last one, so the
    other values are silently lost.

    ## Incorrect Code Examples

    ```json
    { "title": "Home", "title": "Welcome" }
    ```
    */
    JsonDuplicateKeys,
    json,
    tags(Recommended),
    severity(Error),
    tree(Json),
    "JsonDuplicateKeys"
}

impl Check for JsonDuplicateKeys {
    fn create(&self, _: &RunContext<'_>) -> Result<Handler, CheckError> {
        Ok(Handler::json(JsonDuplicateKeysVisitor))
    }
}

struct JsonDuplicateKeysVisitor;

#[async_trait(?Send)]
impl CheckVisitor<JsonNode> for JsonDuplicateKeysVisitor {
    fn interests(&self) -> Vec<JsonKind> {
        vec![JsonKind::Object]
    }

    async fn on_node(&mut self, node: &JsonNode, _: &[&JsonNode], ctx: &mut RunContext<'_>) -> CheckResult {
        let mut seen = HashSet::new();
        for property in node.children() {
            if let JsonNode::Property { key, .. } = property {
                if let JsonNode::Identifier { value, span } = &**key {
                    if !seen.insert(value) {
                        ctx.report_span(format!("Duplicate key '{}'", value), *span);
                    }
                }
            }
        }
        Ok(())
    }
}
