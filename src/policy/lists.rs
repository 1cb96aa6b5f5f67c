//! Built-in domain lists
//!
//! Membership is policy, not algorithm: both lists can be extended or replaced
//! through the `[policy]` configuration table.

/// Analytics, advertising, session-recording and chat-widget domains
pub const TRACKING_DOMAINS: &[&str] = &[
    // Google
    "google-analytics.com",
    "googletagmanager.com",
    "googletagservices.com",
    "googleadservices.com",
    "googlesyndication.com",
    "doubleclick.net",
    // Meta
    "connect.facebook.net",
    "facebook.net",
    // Microsoft / LinkedIn / X / TikTok / Snap / Pinterest
    "clarity.ms",
    "bat.bing.com",
    "snap.licdn.com",
    "ads-twitter.com",
    "analytics.twitter.com",
    "analytics.tiktok.com",
    "sc-static.net",
    "ct.pinterest.com",
    // Product analytics and session replay
    "hotjar.com",
    "segment.com",
    "segment.io",
    "mixpanel.com",
    "amplitude.com",
    "heapanalytics.com",
    "fullstory.com",
    "mouseflow.com",
    "crazyegg.com",
    "luckyorange.com",
    "optimizely.com",
    "plausible.io",
    "matomo.cloud",
    "statcounter.com",
    "quantserve.com",
    "scorecardresearch.com",
    "chartbeat.com",
    "nr-data.net",
    "cloudflareinsights.com",
    "mc.yandex.ru",
    // Marketing automation
    "hs-scripts.com",
    "hs-analytics.net",
    "hs-banner.com",
    "klaviyo.com",
    "adroll.com",
    "criteo.com",
    "taboola.com",
    "outbrain.com",
    "amazon-adsystem.com",
    "adnxs.com",
    // Chat widgets
    "intercom.io",
    "intercomcdn.com",
    "js.driftt.com",
    "drift.com",
    "crisp.chat",
    "tawk.to",
    "zdassets.com",
    "livechatinc.com",
    "olark.com",
    "zopim.com",
    "onesignal.com",
];

/// Public CDNs whose stylesheets stay external references
pub const CDN_DOMAINS: &[&str] = &[
    "cdnjs.cloudflare.com",
    "cdn.jsdelivr.net",
    "unpkg.com",
    "fonts.googleapis.com",
    "fonts.gstatic.com",
    "stackpath.bootstrapcdn.com",
    "maxcdn.bootstrapcdn.com",
    "cdn.tailwindcss.com",
    "use.fontawesome.com",
    "kit.fontawesome.com",
    "code.jquery.com",
    "ajax.googleapis.com",
    "images.unsplash.com",
    "use.typekit.net",
    "cdn.skypack.dev",
    "esm.sh",
];

/// Inline script fragments that identify analytics bootstraps
pub const TRACKING_SCRIPT_SIGNATURES: &[&str] = &[
    "gtag(",
    "fbq(",
    "datalayer.push",
    "_gaq.push",
    "googleanalyticsobject",
    "googletagmanager.com",
    "google-analytics.com",
    "connect.facebook.net",
    "static.hotjar.com",
    "_hsq.push",
    "clarity.ms",
];

/// Pixel endpoints on hosts that also serve ordinary content
///
/// Matched as substrings of the lowercased reference, so `www.facebook.com/tr?id=1`
/// is a pixel while `www.facebook.com/acme` is not.
pub const TRACKING_PIXEL_PATHS: &[&str] = &[
    "facebook.com/tr",
    "linkedin.com/px",
    "px.ads.linkedin.com/collect",
    "bat.bing.com/action",
    "analytics.twitter.com/i/adsct",
    "t.co/i/adsct",
    "ct.pinterest.com/v3",
    "google.com/ads/ga-audiences",
    "googleadservices.com/pagead/conversion",
];
