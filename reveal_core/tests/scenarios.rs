use book_model::{CharacterId, NodeRef, WorkDataset};
use rand::rngs::StdRng;
use rand::SeedableRng;
use reveal_core::{
    AnnotationPolicy, GraphModelBuilder, Hierarchy, RenderCommand, Viewer, ViewerState, VisibilityFilter,
    VisibilityOptions, WorkLibrary,
};

fn fixture(name: &str) -> WorkDataset {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    WorkDataset::load(&path).unwrap()
}

fn visible_ids(dataset: &WorkDataset, hierarchy: &Hierarchy, at: NodeRef) -> Vec<String> {
    VisibilityFilter::with_defaults()
        .filter(dataset, hierarchy, &at)
        .characters
        .iter()
        .map(|c| c.id.to_string())
        .collect()
}

#[test]
fn test_twelve_chapters_reveal_in_order() {
    let dataset = fixture("twelve_chapters.json");
    let hierarchy = Hierarchy::from_dataset(&dataset);
    assert_eq!(hierarchy.len(), 12);

    assert_eq!(visible_ids(&dataset, &hierarchy, NodeRef::chapter(3)), ["a"]);
    assert_eq!(visible_ids(&dataset, &hierarchy, NodeRef::chapter(6)), ["a", "b"]);
    assert_eq!(visible_ids(&dataset, &hierarchy, NodeRef::id("ch5")), ["a"]);
}

#[test]
fn test_dangling_relationship_never_visible() {
    let dataset = fixture("twelve_chapters.json");
    let hierarchy = Hierarchy::from_dataset(&dataset);
    let nobody = CharacterId::from("nobody");
    let filter = VisibilityFilter::with_defaults();
    for index in 0..=14 {
        let set = filter.filter(&dataset, &hierarchy, &NodeRef::index(index));
        assert!(set.relationships.iter().all(|r| !r.relationship.involves(&nobody)));
    }
}

#[test]
fn test_faction_join_after_first_appearance() {
    let dataset = fixture("twelve_chapters.json");
    let hierarchy = Hierarchy::from_dataset(&dataset);
    let filter = VisibilityFilter::with_defaults();
    let b = CharacterId::from("b");

    let at_six = filter.filter(&dataset, &hierarchy, &NodeRef::chapter(6));
    let joined: Vec<&str> = at_six.active_factions(&b).iter().map(|f| f.as_str()).collect();
    assert_eq!(joined, ["guild"]);

    let at_nine = filter.filter(&dataset, &hierarchy, &NodeRef::chapter(9));
    let joined: Vec<&str> = at_nine.active_factions(&b).iter().map(|f| f.as_str()).collect();
    assert_eq!(joined, ["guild", "crown"]);
}

#[test]
fn test_progressive_annotations_end_to_end() {
    let dataset = fixture("twelve_chapters.json");
    let hierarchy = Hierarchy::from_dataset(&dataset);
    let filter = VisibilityFilter::new(VisibilityOptions {
        annotations: AnnotationPolicy::Progressive,
    });
    let graph = GraphModelBuilder::with_defaults();

    let at_seven = filter.filter(&dataset, &hierarchy, &NodeRef::chapter(7));
    let edges = graph.build_seeded(&at_seven, None, 1).edges;
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].label, "Rivals");
    assert_eq!(edges[0].annotations, 1);

    let at_end = filter.filter(&dataset, &hierarchy, &NodeRef::chapter(12));
    assert_eq!(graph.build_seeded(&at_end, None, 1).edges[0].annotations, 2);
}

#[test]
fn test_switching_work_resets_to_first_node() {
    let library = WorkLibrary::from_datasets([fixture("twelve_chapters.json"), fixture("two_towers.toml")]);
    let viewer = Viewer::with_defaults();
    let mut rng = StdRng::seed_from_u64(42);

    let twelve = library.get(&"twelve".into()).unwrap();
    let mut state = ViewerState::open(twelve);
    state.select(twelve, NodeRef::chapter(12));
    let frame = viewer.recompute(twelve, &state, &mut rng);
    state.mark_mounted();
    state.record_layout(frame.graph.positions());
    assert_eq!(frame.graph.nodes.len(), 2);

    state.switch_work(&library, &"two-towers".into()).unwrap();
    let towers = library.get(&state.work).unwrap();
    let frame = viewer.recompute(towers, &state, &mut rng);
    assert_eq!(frame.command, RenderCommand::Mount);
    assert_eq!(frame.position.map(|p| p.global_index), Some(1));
    let ids: Vec<&str> = frame.graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, ["aragorn"]);
}

#[test]
fn test_positions_continuous_across_builds() {
    let dataset = fixture("twelve_chapters.json");
    let hierarchy = Hierarchy::from_dataset(&dataset);
    let visible = VisibilityFilter::with_defaults().filter(&dataset, &hierarchy, &NodeRef::chapter(12));
    let builder = GraphModelBuilder::with_defaults();

    let first = builder.build_seeded(&visible, None, 3);
    let previous = first.positions();
    let again = builder.build_seeded(&visible, Some(&previous), 77);
    let later = builder.build_seeded(&visible, Some(&previous), 1234);
    assert_eq!(again, later);
    for node in &first.nodes {
        assert_eq!(again.node(&node.id).unwrap().position, node.position);
    }
}

#[test]
fn test_details_view_after_activation() {
    let library = WorkLibrary::from_datasets([fixture("two_towers.toml")]);
    let work = library.first().unwrap();
    let viewer = Viewer::with_defaults();
    let mut state = ViewerState::open(work);
    state.select(work, NodeRef::id("riders"));

    let details = viewer.activate(work, &state, &"aragorn".into()).unwrap();
    assert_eq!(details.first_appearance, "The Treason of Isengard");
    assert_eq!(details.factions[0].title, "Dúnedain");
    assert_eq!(details.relationships[0].other_name, "Éomer");
    assert_eq!(details.relationships[0].annotations[0].text, "Meet on the plains");
}

#[test]
fn test_frame_lists_locations_of_selected_node() {
    let library = WorkLibrary::from_datasets([fixture("two_towers.toml")]);
    let work = library.first().unwrap();
    let viewer = Viewer::with_defaults();
    let mut state = ViewerState::open(work);
    let mut rng = StdRng::seed_from_u64(8);

    assert!(viewer.recompute(work, &state, &mut rng).locations.is_empty());

    state.select(work, NodeRef::id("riders"));
    let frame = viewer.recompute(work, &state, &mut rng);
    let names: Vec<&str> = frame.locations.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["Rohan", "Unknown Location"]);
}
