//! The single container whose content is replaced on every in-page
//! navigation.

use crate::config::{Classes, Selectors};
use crate::host::Dom;

/// Find the wrapper, or build it once by moving everything between the
/// header and the footer into a fresh `<div>`.
///
/// The loader overlay and top-level scripts stay where they are. Returns
/// `None` only when the document has no `<body>`.
pub fn ensure_wrapper<D: Dom + ?Sized>(
    dom: &D,
    selectors: &Selectors,
    classes: &Classes,
) -> Option<D::Node> {
    if let Some(existing) = dom.element_by_id(&selectors.wrapper_id) {
        return Some(existing);
    }

    let body = dom.body()?;
    let children = dom.children(&body);

    let header = dom.query_selector(&selectors.header);
    let footer = dom.query_selector(&selectors.footer);
    let loader = dom.query_selector(&selectors.loader);

    let start = header
        .as_ref()
        .and_then(|header| children.iter().position(|child| child == header))
        .map_or(0, |index| index + 1);
    let end = footer
        .as_ref()
        .and_then(|footer| children.iter().position(|child| child == footer))
        .filter(|index| *index >= start)
        .unwrap_or(children.len());

    let content: Vec<D::Node> = children[start..end]
        .iter()
        .filter(|child| Some(*child) != loader.as_ref())
        .filter(|child| dom.tag_name(child) != "script")
        .cloned()
        .collect();

    let wrapper = dom.create_element("div")?;
    dom.set_attribute(&wrapper, "id", &selectors.wrapper_id);
    dom.add_class(&wrapper, &classes.wrapper);

    let anchor = children.get(end);
    dom.insert_before(&body, &wrapper, anchor);

    for node in &content {
        dom.append_child(&wrapper, node);
    }

    crate::debug_log!("built content wrapper around {} nodes", content.len());

    Some(wrapper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHost;

    fn build(body: &str) -> (TestHost, Option<crate::testing::NodeId>) {
        let host = TestHost::page("https://hotel.test/", body);
        let wrapper = ensure_wrapper(&host, &Selectors::default(), &Classes::default());
        (host, wrapper)
    }

    #[test]
    fn test_wraps_content_between_header_and_footer() {
        let (host, wrapper) = build(
            r#"<header>h</header><div id="page-loader"></div><main>m</main><section>s</section><script>x()</script><footer>f</footer>"#,
        );

        assert!(wrapper.is_some());
        assert_eq!(
            host.body_html(),
            r#"<header>h</header><div id="page-loader"></div><script>x()</script><div id="spa-wrapper" class="spa-wrapper"><main>m</main><section>s</section></div><footer>f</footer>"#
        );
    }

    #[test]
    fn test_existing_wrapper_is_reused() {
        let (host, first) =
            build(r#"<header></header><div id="spa-wrapper"><p>x</p></div><footer></footer>"#);
        let second = ensure_wrapper(&host, &Selectors::default(), &Classes::default());

        assert_eq!(first, second);
        assert_eq!(host.query_selector_all("#spa-wrapper").len(), 1);
    }

    #[test]
    fn test_without_header_or_footer_wraps_everything() {
        let (host, wrapper) = build("<main>only</main>");
        let wrapper = wrapper.unwrap();

        assert_eq!(host.inner_html(&wrapper), "<main>only</main>");
    }
}
