//! Replacing the wrapper content: fade out, inject, re-run scripts, preload
//! the hero image, fade in. Every step finishes before the next one starts.

use std::time::Duration;

use concierge_router::Fragment;

use crate::config::RouterConfig;
use crate::host::Host;
use crate::loader::LoaderIndicator;
use crate::transition::{Settled, settle_within};

/// How the hero image of the new content was waited for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeroPreload {
    /// The fragment has no hero image.
    Absent,
    /// Already decoded, no wait.
    Ready,
    /// `load` or `error` fired before the ceiling.
    Settled,
    /// Neither fired in time.
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapReport {
    pub fade_out: Settled,
    pub hero: HeroPreload,
    pub fade_in: Settled,
    pub scripts: usize,
}

pub async fn swap<H: Host>(
    host: &H,
    config: &RouterConfig,
    loader: &LoaderIndicator<H>,
    wrapper: &H::Node,
    fragment: &Fragment,
) -> SwapReport {
    let timings = &config.timings;

    let fade_out = fade(
        host,
        wrapper,
        "0",
        timings.fade_out(),
        timings.fade_ceiling(timings.fade_out()),
    )
    .await;

    host.set_inner_html(wrapper, &fragment.html);
    if let Some(title) = &fragment.title {
        host.set_title(title);
    }

    let scripts = rerun_scripts(host, wrapper);
    let hero = preload_hero(host, wrapper, &config.selectors.hero, timings.hero_timeout()).await;

    let fade_in = fade(
        host,
        wrapper,
        "1",
        timings.fade_in(),
        timings.fade_ceiling(timings.fade_in()),
    )
    .await;

    loader.hide();

    SwapReport {
        fade_out,
        hero,
        fade_in,
        scripts,
    }
}

async fn fade<H: Host>(
    host: &H,
    wrapper: &H::Node,
    opacity: &str,
    duration: Duration,
    ceiling: Duration,
) -> Settled {
    let done = host.transition_end(wrapper);

    host.set_style(
        wrapper,
        "transition",
        &format!("opacity {}ms ease", duration.as_millis()),
    );
    host.set_style(wrapper, "opacity", opacity);

    settle_within(host, done, ceiling).await
}

/// Markup injection leaves `<script>` elements inert; swap each one for a
/// freshly created copy so it runs. Returns how many were replaced.
pub fn rerun_scripts<H: Host + ?Sized>(host: &H, root: &H::Node) -> usize {
    let mut count = 0;

    for inert in host.query_within(root, "script") {
        let Some(fresh) = host.create_element("script") else {
            continue;
        };

        for (name, value) in host.attributes(&inert) {
            host.set_attribute(&fresh, &name, &value);
        }
        host.set_text(&fresh, &host.text(&inert));
        host.replace_node(&inert, &fresh);
        count += 1;
    }

    count
}

/// Load the hero image of `root` at high priority and wait for it, but never
/// longer than `ceiling`.
pub async fn preload_hero<H: Host + ?Sized>(
    host: &H,
    root: &H::Node,
    selector: &str,
    ceiling: Duration,
) -> HeroPreload {
    let Some(marked) = host.query_within(root, selector).into_iter().next() else {
        return HeroPreload::Absent;
    };

    let image = if host.tag_name(&marked) == "img" {
        marked
    } else {
        match host.query_within(&marked, "img").into_iter().next() {
            Some(image) => image,
            None => return HeroPreload::Absent,
        }
    };

    host.set_attribute(&image, "loading", "eager");
    host.set_attribute(&image, "fetchpriority", "high");

    if host.image_ready(&image) {
        return HeroPreload::Ready;
    }

    match settle_within(host, host.image_settled(&image), ceiling).await {
        Settled::Completed => HeroPreload::Settled,
        Settled::TimedOut => {
            crate::debug_log!("hero image still loading after {:?}", ceiling);
            HeroPreload::TimedOut
        }
    }
}
