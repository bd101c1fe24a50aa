//! Tests for construct composition: append, prepend, remove, replace, copy

use rstest::{fixture, rstest};

use sensorseq::util::testing::init_test_setup;
use sensorseq::{
    ColorMode, DesignArena, Domain, DomainError, DomainRef, FormatOptions, Part, Sequence,
};

struct Bob {
    arena: DesignArena,
    bob: sensorseq::ConstructId,
}

#[fixture]
fn bob() -> Bob {
    init_test_setup();
    let mut arena = DesignArena::new();
    let bob = arena.new_construct("Bob");
    let a = arena.add_domain(Domain::new("A", "AAAAAA"));
    arena.append(bob, a).unwrap();
    Bob { arena, bob }
}

// ============================================================
// Append / prepend
// ============================================================

#[rstest]
fn given_one_domain_when_reading_then_views_match(bob: Bob) {
    let view = bob.arena.view(bob.bob);

    assert_eq!(view.seq(), "AAAAAA");
    assert_eq!(view.constraints(), "......");
    assert_eq!(view.len(), 6);
    assert_eq!(view.format(&FormatOptions::plain()), view.seq());
    for (i, expected) in view.seq().chars().enumerate() {
        assert_eq!(view.base(i), Some(expected));
    }
}

#[rstest]
fn given_construct_when_appending_domain_then_concatenates(mut bob: Bob) {
    // Arrange
    let c = bob.arena.add_domain(Domain::new("C", "CCCCCC"));

    // Act
    bob.arena.append(bob.bob, c).unwrap();

    // Assert
    let view = bob.arena.view(bob.bob);
    assert_eq!(view.seq(), "AAAAAACCCCCC");
    assert_eq!(view.len(), 12);
    assert_eq!(view.constraints(), ".".repeat(12));
}

#[rstest]
fn given_unknown_name_when_looking_up_then_errors(bob: Bob) {
    let result = bob.arena.view(bob.bob).domain("not a domain");
    assert!(matches!(result, Err(DomainError::UnknownName(_))));
}

#[test]
fn given_two_constructs_when_concatenating_then_seq_distributes() {
    let mut arena = DesignArena::new();
    let a = arena.construct_from("a", [Domain::new("x", "ACGU"), Domain::new("y", "GG")]);
    let b = arena.construct_from("b", [Domain::new("z", "UUUA")]);
    let expected = format!("{}{}", arena.view(a).seq(), arena.view(b).seq());

    arena.append(a, b).unwrap();

    assert_eq!(arena.view(a).seq(), expected);
    // append merges by handle; the appended construct is unchanged
    assert_eq!(arena.view(b).seq(), "UUUA");
}

#[rstest]
fn given_original_walkthrough_when_composing_carol_then_tracks_every_step(mut bob: Bob) {
    let arena = &mut bob.arena;
    let c = arena.add_domain(Domain::new("C", "CCCCCC"));
    arena.append(bob.bob, c).unwrap();

    let carol = arena.construct_from("Carol", [Domain::new("G", "GGGGGG")]);
    let carol = arena
        .concat("Carol", &[Part::Construct(carol), Part::Construct(bob.bob)])
        .unwrap();
    assert_eq!(arena.view(carol).seq(), "GGGGGGAAAAAACCCCCC");
    assert_eq!(arena.view(carol).constraints(), ".".repeat(18));

    let t = arena.add_domain(Domain::new("T", "TTTTTT"));
    arena.prepend(carol, t).unwrap();
    assert_eq!(arena.view(carol).seq(), "TTTTTTGGGGGGAAAAAACCCCCC");

    let cg = arena.add_domain(Domain::new("CG", "CGCGCG"));
    arena.replace(carol, "G", cg).unwrap();
    assert_eq!(arena.view(carol).seq(), "TTTTTTCGCGCGAAAAAACCCCCC");
    assert_eq!(arena.view(carol).len(), 24);

    arena.remove(carol, &["CG".into()]).unwrap();
    assert_eq!(arena.view(carol).seq(), "TTTTTTAAAAAACCCCCC");
    assert_eq!(arena.view(carol).constraints(), ".".repeat(18));
}

// ============================================================
// Remove / replace
// ============================================================

#[test]
fn given_ambiguous_name_when_removing_then_errors_without_change() {
    let mut arena = DesignArena::new();
    let c = arena.construct_from(
        "twins",
        [Domain::new("x", "AA"), Domain::new("x", "CC"), Domain::new("y", "GG")],
    );

    let result = arena.remove(c, &["y".into(), "x".into()]);

    assert_eq!(
        result,
        Err(DomainError::AmbiguousName {
            name: "x".into(),
            count: 2
        })
    );
    assert_eq!(arena.view(c).seq(), "AACCGG");
}

#[test]
fn given_domain_handle_when_removing_duplicated_name_then_removes_that_one() {
    let mut arena = DesignArena::new();
    let c = arena.new_construct("twins");
    let first = arena.add_domain(Domain::new("x", "AA"));
    let second = arena.add_domain(Domain::new("x", "CC"));
    arena.append(c, first).unwrap();
    arena.append(c, second).unwrap();

    arena.remove(c, &[DomainRef::Id(second)]).unwrap();

    assert_eq!(arena.view(c).seq(), "AA");
}

#[test]
fn given_foreign_domain_when_removing_then_reports_membership() {
    let mut arena = DesignArena::new();
    let c = arena.construct_from("c", [Domain::new("x", "AA")]);
    let stray = arena.add_domain(Domain::new("stray", "GG"));

    let result = arena.remove(c, &[stray.into()]);

    assert!(matches!(result, Err(DomainError::NotAMember { .. })));
}

#[test]
fn given_replacement_construct_when_replacing_then_splices_at_vacated_position() {
    let mut arena = DesignArena::new();
    let c = arena.construct_from(
        "c",
        [Domain::new("a", "AA"), Domain::new("b", "CC"), Domain::new("d", "GG")],
    );
    let insert = arena.construct_from("insert", [Domain::new("u", "UUU"), Domain::new("t", "T")]);

    arena.replace(c, "b", insert).unwrap();

    assert_eq!(arena.view(c).seq(), "AAUUUTGG");
}

#[test]
fn given_unknown_part_when_replacing_then_leaves_construct_untouched() {
    let mut arena = DesignArena::new();
    let c = arena.construct_from("c", [Domain::new("a", "AA"), Domain::new("b", "CC")]);
    let gone = arena.new_construct("gone");
    arena.remove_construct(gone).unwrap();

    let result = arena.replace(c, "b", gone);

    assert_eq!(result, Err(DomainError::UnknownConstruct));
    assert_eq!(arena.view(c).seq(), "AACC");
}

// ============================================================
// Sharing and copies
// ============================================================

#[test]
fn given_shared_domain_when_mutating_then_every_owner_sees_it() {
    let mut arena = DesignArena::new();
    let wildtype = arena.construct_from("wt", [Domain::new("spacer", "GGGG").with_mutable(true)]);
    let design = arena.concat("design", &[Part::Construct(wildtype)]).unwrap();
    let spacer = arena.find_domain(wildtype, "spacer").unwrap();

    assert!(arena.is_shared(spacer));
    assert_eq!(arena.owners(spacer).len(), 2);

    arena.domain_mut(spacer).unwrap().set(0, "A").unwrap();

    assert_eq!(arena.view(wildtype).seq(), "AGGG");
    assert_eq!(arena.view(design).seq(), "AGGG");
}

#[test]
fn given_copy_when_mutating_then_original_is_independent() {
    let mut arena = DesignArena::new();
    let wildtype = arena.construct_from("wt", [Domain::new("spacer", "GGGG").with_mutable(true)]);
    let copy = arena.copy_construct(wildtype).unwrap();
    let copied_spacer = arena.find_domain(copy, "spacer").unwrap();

    arena.domain_mut(copied_spacer).unwrap().append("CC").unwrap();

    assert_eq!(arena.view(wildtype).seq(), "GGGG");
    assert_eq!(arena.view(copy).seq(), "GGGGCC");
    assert!(!arena.is_shared(copied_spacer));
    assert_eq!(arena.construct(copy).unwrap().name, "wt");
}

#[test]
fn given_construct_with_repeated_domain_when_copying_then_keeps_repeat_shared() {
    let mut arena = DesignArena::new();
    let c = arena.new_construct("repeat");
    let unit = arena.add_domain(Domain::new("unit", "AC").with_mutable(true));
    arena.append(c, unit).unwrap();
    arena.append(c, unit).unwrap();

    let copy = arena.copy_construct(c).unwrap();
    let copied = arena.construct(copy).unwrap().domains().to_vec();

    assert_eq!(copied.len(), 2);
    assert_eq!(copied[0], copied[1]);
    assert_ne!(copied[0], unit);
}

#[test]
fn given_attached_construct_when_removing_it_then_reports_in_use() {
    let mut arena = DesignArena::new();
    let nested = arena.construct_from("nested", [Domain::new("n", "AA")]);
    let host = arena.construct_from(
        "host",
        [Domain::new("h", "CCCC")
            .with_attachment_sites(sensorseq::AttachmentSites::Anywhere)
            .unwrap()],
    );
    arena.attach(host, nested, "h", 2, "h", 2).unwrap();

    assert_eq!(
        arena.remove_construct(nested).unwrap_err(),
        DomainError::InUse("nested".into())
    );
    arena.unattach(host, nested).unwrap();
    assert!(arena.remove_construct(nested).is_ok());
}

// ============================================================
// Formatting
// ============================================================

#[test]
fn given_window_when_formatting_then_clips_pads_and_labels() {
    let mut arena = DesignArena::new();
    let c = arena.construct_from("c", [Domain::new("a", "AAAT"), Domain::new("b", "CCCU")]);

    let window = FormatOptions::plain().with_window(2, 6);
    assert_eq!(arena.format(c, &window).unwrap(), "ATCC");
    assert_eq!(arena.format(c, &window.clone().with_pad(true)).unwrap(), "  ATCC");
    assert_eq!(
        arena
            .format(c, &FormatOptions::plain().with_labels(true))
            .unwrap(),
        "5'-AAATCCCU-3'"
    );
    assert_eq!(
        arena
            .format(c, &FormatOptions::plain().with_view(sensorseq::View::Rna))
            .unwrap(),
        arena.view(c).rna()
    );
}

#[test]
fn given_styled_domains_when_formatting_plain_then_strips_style() {
    let mut arena = DesignArena::new();
    let style = "red bold".parse().unwrap();
    let c = arena.construct_from("c", [Domain::new("a", "ACGU").with_style(style)]);

    let options = FormatOptions::default().with_color(ColorMode::Never);
    assert_eq!(arena.format(c, &options).unwrap(), "ACGU");
}

#[test]
fn given_construct_names_when_deriving_then_tokenizes() {
    let mut arena = DesignArena::new();
    let c = arena.new_construct("mhf 30/37");
    let construct = arena.construct(c).unwrap();
    assert_eq!(construct.function_name().as_deref(), Some("mhf(30,37)"));
    assert_eq!(construct.underscore_name(), "mhf_30_37");
}

#[test]
fn given_removed_construct_when_viewing_then_reads_empty_but_arena_reports_error() {
    init_test_setup();
    let mut arena = DesignArena::new();
    let c = arena.construct_from("gone", [Domain::new("a", "ACGU")]);
    arena.remove_construct(c).unwrap();

    let view = arena.view(c);

    assert_eq!(view.seq(), "");
    assert_eq!(view.len(), 0);
    assert_eq!(arena.seq(c), Err(DomainError::UnknownConstruct));
}

#[test]
fn given_constructs_when_renaming_and_listing_then_tracks_each_handle() {
    let mut arena = DesignArena::new();
    let a = arena.new_construct("a");
    let b = arena.new_construct("b");

    arena.rename(a, "wildtype").unwrap();

    assert_eq!(arena.construct(a).unwrap().name, "wildtype");
    let ids: Vec<_> = arena.construct_ids().collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&a) && ids.contains(&b));

    arena.remove_construct(b).unwrap();
    assert_eq!(arena.rename(b, "stale"), Err(DomainError::UnknownConstruct));
    assert_eq!(arena.construct_ids().collect::<Vec<_>>(), vec![a]);
}

#[rstest]
#[case::rna(sensorseq::Polymer::Rna, 1444.8)]
#[case::dna(sensorseq::Polymer::Dna, 2347.6)]
#[case::ssdna(sensorseq::Polymer::SsDna, 1173.8)]
fn given_construct_when_computing_mass_then_uses_flattened_sequence(
    #[case] polymer: sensorseq::Polymer,
    #[case] expected: f64,
) {
    let mut arena = DesignArena::new();
    let c = arena.construct_from("c", [Domain::new("a", "AC"), Domain::new("b", "TG")]);

    let mass = arena.view(c).mass(polymer);

    assert!((mass - expected).abs() < 1e-6, "{polymer}: {mass}");
}
