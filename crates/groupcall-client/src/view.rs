//! Presentation collaborator
//!
//! The session decides *what* changes on screen; a [`RoomView`] decides how it
//! looks. [`ConsoleView`] is the terminal rendition used by the `groupcall`
//! binary.

use crate::chat::ChatLine;
use std::collections::HashMap;
use std::fmt;

/// Opaque identifier of a rendered participant tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId(u64);

impl TileId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile-{}", self.0)
    }
}

/// Renders participant tiles and the chat transcript
pub trait RoomView: Send {
    /// Render a tile for a new participant
    fn create_tile(&mut self, name: &str, is_local_user: bool) -> TileId;

    /// Refresh the status label shown next to a tile's name
    fn update_tile(&mut self, tile: TileId, label: &str);

    /// Destroy a tile
    fn remove_tile(&mut self, tile: TileId);

    /// Show `tile` as the featured (main) tile, or feature nothing
    fn set_featured(&mut self, tile: Option<TileId>);

    /// Append a line to the chat transcript
    fn append_chat(&mut self, line: &ChatLine);

    /// Show the roster, one entry per participant
    fn show_roster(&mut self, entries: &[String]);

    /// Switch from the join form to the room
    fn room_entered(&mut self, room: &str);

    /// Return to the pre-join state
    fn room_exited(&mut self);
}

/// Terminal view writing tiles and chat to stdout
#[derive(Debug, Default)]
pub struct ConsoleView {
    next_tile: u64,
    tiles: HashMap<TileId, String>,
    featured: Option<TileId>,
}

impl ConsoleView {
    pub fn new() -> Self {
        Self::default()
    }

    fn tile_name(&self, tile: TileId) -> &str {
        self.tiles.get(&tile).map(String::as_str).unwrap_or("?")
    }
}

impl RoomView for ConsoleView {
    fn create_tile(&mut self, name: &str, _is_local_user: bool) -> TileId {
        let tile = TileId::new(self.next_tile);
        self.next_tile += 1;
        self.tiles.insert(tile, name.to_string());
        tile
    }

    fn update_tile(&mut self, tile: TileId, label: &str) {
        println!("* {}{}", self.tile_name(tile), label);
    }

    fn remove_tile(&mut self, tile: TileId) {
        if self.featured == Some(tile) {
            self.featured = None;
        }
        self.tiles.remove(&tile);
    }

    fn set_featured(&mut self, tile: Option<TileId>) {
        self.featured = tile;
        match tile {
            Some(tile) => println!("* featuring {}", self.tile_name(tile)),
            None => println!("* no featured participant"),
        }
    }

    fn append_chat(&mut self, line: &ChatLine) {
        if line.is_system() {
            println!("-- {}", line.render());
        } else {
            println!("{}", line.render());
        }
    }

    fn show_roster(&mut self, entries: &[String]) {
        println!("* {} in room:", entries.len());
        for entry in entries {
            println!("    {}", entry);
        }
    }

    fn room_entered(&mut self, room: &str) {
        println!("ROOM {}", room);
    }

    fn room_exited(&mut self) {
        self.tiles.clear();
        self.featured = None;
        println!("* left the room");
    }
}
