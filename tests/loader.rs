//! CSV ingestion: schema detection, tolerant row handling, failure policy.

use std::io::Write;

use hexroute::{build_graph, CsvSource, LoadError};
use tempfile::NamedTempFile;

fn write_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

const SHORTCUTS_CSV: &str = "\
from_edge,to_edge,cost,via_edge,cell,inside
1,2,10.0,0,0,1
2,3,5.5,0,0,-1
1,3,15.5,2,0,0
";

const EDGES_CSV: &str = "\
id,from_cell,to_cell,lca_res,length,cost,geometry
1,0,0,-1,120.5,1.0,\"LINESTRING (4.35 50.85, 4.351 50.851)\"
2,0,0,-1,80.0,1.5,\"LINESTRING (4.351 50.851, 4.352 50.852)\"
3,0,0,-1,60.0,2.0,
";

#[test]
fn test_csv_round_trip() {
    let shortcuts = write_file(SHORTCUTS_CSV);
    let edges = write_file(EDGES_CSV);

    let mut source = CsvSource::new(shortcuts.path(), edges.path());
    let graph = build_graph(&mut source).unwrap();

    assert_eq!(graph.shortcut_count(), 3);
    assert_eq!(graph.edge_count(), 3);
    assert_eq!(graph.max_edge_id(), 3);
    graph.validate().unwrap();

    let meta = graph.edge_meta(1).unwrap();
    assert_eq!(meta.length, 120.5);
    assert_eq!(meta.geometry, vec![(4.35, 50.85), (4.351, 50.851)]);
    assert!(graph.edge_meta(3).unwrap().geometry.is_empty());

    // The (1,3) shortcut keeps its via edge through the packed field
    let via = graph.find_shortcut(1, 3).unwrap();
    assert_eq!(via.via_edge(), 2);
}

#[test]
fn test_alternate_cell_column_names() {
    let shortcuts = write_file(SHORTCUTS_CSV);
    let edges = write_file(
        "\
id,incoming_cell,outgoing_cell,lca_res,length,cost,geometry
1,617700169958293503,617700169958293503,9,10.0,1.0,
2,617700169958293503,617700169958293503,9,10.0,1.0,
3,0,0,-1,10.0,1.0,
",
    );

    let mut source = CsvSource::new(shortcuts.path(), edges.path());
    let graph = build_graph(&mut source).unwrap();
    assert_eq!(graph.edge_meta(1).unwrap().from_cell, 617700169958293503);
    assert_eq!(graph.edge_meta(1).unwrap().to_cell, 617700169958293503);
}

#[test]
fn test_malformed_rows_are_skipped() {
    let shortcuts = write_file(
        "\
from_edge,to_edge,cost,via_edge,cell,inside
1,2,10.0,0,0,1
not,a,row,at,all,?
3,4,abc,0,0,1
5,6,1.0,0,0,7
2,3,2.0,0,0,-1
",
    );
    let edges = write_file(EDGES_CSV);

    let mut source = CsvSource::new(shortcuts.path(), edges.path());
    let graph = build_graph(&mut source).unwrap();
    // Only the two well-formed rows survive
    assert_eq!(graph.shortcut_count(), 2);
}

#[test]
fn test_missing_column_is_schema_error() {
    let shortcuts = write_file("from_edge,to_edge,cost\n1,2,3.0\n");
    let edges = write_file(EDGES_CSV);

    let mut source = CsvSource::new(shortcuts.path(), edges.path());
    match build_graph(&mut source) {
        Err(LoadError::Schema(msg)) => assert!(msg.contains("via_edge")),
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn test_unopenable_source_is_io_error() {
    let edges = write_file(EDGES_CSV);
    let mut source = CsvSource::new("/nonexistent/shortcuts.csv", edges.path());
    assert!(matches!(build_graph(&mut source), Err(LoadError::Io(_))));
}

#[test]
fn test_all_rows_malformed_is_empty_error() {
    let shortcuts = write_file("from_edge,to_edge,cost,via_edge,cell,inside\nx,y,z,w,v,u\n");
    let edges = write_file(EDGES_CSV);

    let mut source = CsvSource::new(shortcuts.path(), edges.path());
    assert!(matches!(
        build_graph(&mut source),
        Err(LoadError::Empty("shortcuts"))
    ));
}
