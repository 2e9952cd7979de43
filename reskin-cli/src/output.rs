//! Plain-text rendering of engine results.

use reskin_engine::{AssetKind, AssetValue, CacheAsset, Profile, ServeOrigin, ServedAsset};

pub fn print_profiles(profiles: &[Profile], active: Option<&str>) {
    if profiles.is_empty() {
        println!("No profiles.");
        return;
    }

    for profile in profiles {
        let marker = if Some(profile.name.as_str()) == active {
            "*"
        } else {
            " "
        };
        let default = if profile.is_default { " (default)" } else { "" };
        println!("{marker} {}{default}  [{}]", profile.name, profile.cache_id);
    }
}

pub fn print_assets(assets: &[CacheAsset]) {
    if assets.is_empty() {
        println!("No visible assets.");
        return;
    }

    for asset in assets {
        println!("{:5}  {}  {}", kind_label(asset.kind), asset.key, value_summary(&asset.value));
    }
}

pub fn print_served(url: &str, served: &ServedAsset) {
    let origin = match served.origin {
        ServeOrigin::OverrideCache => "override cache",
        ServeOrigin::DefaultCache => "default cache",
        ServeOrigin::Network => "network",
    };
    let content_type = served.content_type.as_deref().unwrap_or("unknown");

    println!("{url}");
    println!("  origin:       {origin}");
    println!("  content-type: {content_type}");
    println!("  bytes:        {}", served.body.len());
}

fn kind_label(kind: AssetKind) -> &'static str {
    match kind {
        AssetKind::Image => "image",
        AssetKind::Audio => "audio",
        AssetKind::Video => "video",
        AssetKind::Json => "json",
    }
}

fn value_summary(value: &AssetValue) -> String {
    match value {
        AssetValue::Blob(body) => format!("{} bytes", body.len()),
        AssetValue::Json(json) => {
            let rendered = json.to_string();
            if rendered.chars().count() > 60 {
                let short: String = rendered.chars().take(60).collect();
                format!("{short}…")
            } else {
                rendered
            }
        }
    }
}
