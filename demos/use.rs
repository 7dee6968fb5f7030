use avl_bimap::{AvlBiMap, BoundedText, OversizePolicy, TextLimit};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> avl_bimap::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "avl_bimap=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let limit = TextLimit::new(8, OversizePolicy::Truncate);
    let text = |s: &str| BoundedText::with_limit(s, &limit);

    let mut map = AvlBiMap::new();
    for (code, name) in [("de", "germany"), ("fr", "france"), ("nl", "netherlands"), ("it", "italy")] {
        map.insert_pair(text(code)?, text(name)?)?;
    }

    // Rejected, "fr" is already mapped
    if let Err(err) = map.insert_pair(text("fr")?, text("spain")?) {
        println!("insert failed: {err}");
    }

    println!("by key:");
    for (code, name) in &map {
        println!("  {code} => {name}");
    }
    println!("by value:");
    for (code, name) in map.iter_by_value() {
        println!("  {name} <= {code}");
    }

    assert_eq!(map.get_by_value("netherla").map(|code| code.as_str()), Some("nl"));
    map.delete_by_value("france")?;
    assert!(map.find_by_key("fr").is_none());

    if let Some((code, name)) = map.min_by_value() {
        println!("smallest name: {name} ({code})");
    }
    Ok(())
}
