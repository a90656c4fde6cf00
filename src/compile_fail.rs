//! Contains a set of compile failure doctests.

// -----------------------------------------------------------------------------
// Ensures non-send data cannot be captured by a chunk callback.

/** ```compile_fail,E0277

use std::rc::Rc;
use tickpool::{ChunkRange, Config, Dispatcher};

let shared = Rc::new(22);
let config = Config::new(2, 1).unwrap();
let _dispatcher = Dispatcher::new(config, vec![0u8; 16], move |_: &Vec<u8>, _: ChunkRange| {
    let _ = shared.clone(); //~ ERROR
});

``` */
mod nonsend_callback {}

// -----------------------------------------------------------------------------
// Ensures item sources must be safe to read from several threads at once.

/** ```compile_fail,E0277

use std::cell::Cell;
use tickpool::{ChunkRange, Config, Dispatcher};

let cells: Vec<Cell<u32>> = (0..16).map(Cell::new).collect();
let config = Config::new(2, 1).unwrap();
let _dispatcher = Dispatcher::new(config, cells, |cells: &Vec<Cell<u32>>, chunk: ChunkRange| {
    for index in chunk {
        cells[index].set(cells[index].get() + 1);
    }
}); //~ ERROR

``` */
mod nonsync_source {}

// -----------------------------------------------------------------------------
// Ensures a dispatch cannot start while the source is still borrowed.

/** ```compile_fail,E0502

use tickpool::{ChunkRange, Config, Dispatcher};

let config = Config::new(2, 1).unwrap();
let mut dispatcher = Dispatcher::new(config, vec![0u8; 16], |_: &Vec<u8>, _: ChunkRange| {}).unwrap();

let source = dispatcher.source();
dispatcher.dispatch().unwrap(); //~ ERROR
assert_eq!(source.len(), 16);

``` */
mod dispatch_while_borrowed {}
