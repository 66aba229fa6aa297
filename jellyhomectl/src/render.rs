//! Plain-text rendering of published snapshots.

use std::io::{self, Write};

use jellyhome_core::model::BaseItem;
use jellyhome_core::{FavoritesSnapshot, HomeSnapshot, SubFeedCoordinator};

fn item_line(item: &BaseItem) -> String {
    let mut line = match item.series_name.as_deref() {
        Some(series) => format!("{series}: {}", item.display_name()),
        None => item.display_name().to_string(),
    };
    if let Some(year) = item.production_year {
        line.push_str(&format!(" ({year})"));
    }
    if item.is_played() {
        line.push_str(" [played]");
    }
    format!("  {line}  #{}", item.id)
}

fn section(out: &mut impl Write, title: &str, items: &[BaseItem]) -> io::Result<()> {
    writeln!(out, "{title} ({})", items.len())?;
    for item in items {
        writeln!(out, "{}", item_line(item))?;
    }
    Ok(())
}

fn rail(out: &mut impl Write, feed: &SubFeedCoordinator, show_items: bool) -> io::Result<()> {
    let title = match feed.library() {
        Some(library) => format!("{} / {}", feed.kind(), library.display_name()),
        None => feed.kind().to_string(),
    };
    if show_items {
        section(out, &title, feed.items())
    } else {
        writeln!(out, "{title} ({})", feed.items().len())
    }
}

pub fn home(out: &mut impl Write, snapshot: &HomeSnapshot, show_items: bool) -> io::Result<()> {
    if snapshot.is_empty() {
        return writeln!(out, "Nothing to show yet: every rail came back empty.");
    }

    section(out, "continue watching", &snapshot.resume_items)?;
    let feeds = snapshot
        .latest
        .iter()
        .chain(&snapshot.trending)
        .chain(&snapshot.featuring)
        .chain(&snapshot.next_up)
        .chain(&snapshot.recently_added);
    for feed in feeds {
        rail(out, feed, show_items)?;
    }
    Ok(())
}

pub fn resume(out: &mut impl Write, snapshot: &HomeSnapshot) -> io::Result<()> {
    section(out, "continue watching", &snapshot.resume_items)?;
    if let Some(feed) = &snapshot.next_up {
        rail(out, feed, true)?;
    }
    if let Some(feed) = &snapshot.recently_added {
        rail(out, feed, true)?;
    }
    Ok(())
}

pub fn favorites(out: &mut impl Write, snapshot: &FavoritesSnapshot) -> io::Result<()> {
    if snapshot.has_no_favorites() {
        return writeln!(out, "No favourites yet.");
    }

    for (title, items) in [
        ("movies", &snapshot.movies),
        ("series", &snapshot.series),
        ("episodes", &snapshot.episodes),
        ("collections", &snapshot.collections),
        ("people", &snapshot.people),
    ] {
        if !items.is_empty() {
            section(out, title, items)?;
        }
    }
    Ok(())
}
