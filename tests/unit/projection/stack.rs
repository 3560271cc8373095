use super::*;

fn id(idx: u32) -> NodeId {
    NodeId { idx, generation: 0 }
}

#[test]
fn most_recently_added_member_leads() {
    let mut reg = ContinuityStackRegistry::new();
    let first = reg.add("card", id(1));
    assert_eq!(first.new_lead, Some(id(1)));
    assert_eq!(first.prev_lead, None);

    let second = reg.add("card", id(2));
    assert_eq!(second.new_lead, Some(id(2)));
    assert_eq!(second.prev_lead, Some(id(1)));
    assert_eq!(reg.lead("card"), Some(id(2)));
    assert_eq!(reg.stack("card").unwrap().members(), &[id(1), id(2)]);
}

#[test]
fn re_adding_a_member_moves_it_to_the_front() {
    let mut reg = ContinuityStackRegistry::new();
    reg.add("card", id(1));
    reg.add("card", id(2));
    reg.add("card", id(1));
    let stack = reg.stack("card").unwrap();
    assert_eq!(stack.members(), &[id(2), id(1)]);
    assert_eq!(stack.lead(), Some(id(1)));
    assert_eq!(stack.prev_lead(), Some(id(2)));
}

#[test]
fn removing_the_lead_promotes_the_latest_remaining_member() {
    let mut reg = ContinuityStackRegistry::new();
    reg.add("card", id(1));
    reg.add("card", id(2));
    reg.add("card", id(3));

    let promo = reg.remove("card", id(3)).unwrap();
    assert_eq!(promo.new_lead, Some(id(2)));
    assert_eq!(promo.prev_lead, Some(id(3)));
    assert_eq!(reg.lead("card"), Some(id(2)));
}

#[test]
fn removing_a_follower_keeps_the_lead() {
    let mut reg = ContinuityStackRegistry::new();
    reg.add("card", id(1));
    reg.add("card", id(2));
    assert_eq!(reg.remove("card", id(1)), None);
    assert_eq!(reg.lead("card"), Some(id(2)));
    assert_eq!(reg.remove("card", id(9)), None);
    assert_eq!(reg.remove("missing", id(1)), None);
}

#[test]
fn emptied_stack_is_deleted() {
    let mut reg = ContinuityStackRegistry::new();
    reg.add("card", id(1));
    let promo = reg.remove("card", id(1)).unwrap();
    assert_eq!(promo.new_lead, None);
    assert_eq!(reg.lead("card"), None);
    assert!(reg.stack("card").is_none());
    assert!(reg.is_empty());
}

#[test]
fn relink_moves_node_and_preserves_lead() {
    let mut reg = ContinuityStackRegistry::new();
    reg.add("one", id(1));
    reg.add("one", id(2));
    reg.add("two", id(3));

    let relink = reg.relink(id(2), Some("one"), Some("two"));
    assert_eq!(relink.left.unwrap().new_lead, Some(id(1)));
    let joined = relink.joined.unwrap();
    assert_eq!(joined.new_lead, Some(id(2)));
    assert_eq!(joined.prev_lead, Some(id(3)));

    assert_eq!(reg.lead("one"), Some(id(1)));
    assert_eq!(reg.lead("two"), Some(id(2)));
    assert_eq!(reg.stacks_containing(id(2)), vec!["two"]);
}

#[test]
fn relink_to_same_key_is_a_no_op() {
    let mut reg = ContinuityStackRegistry::new();
    reg.add("one", id(1));
    assert_eq!(reg.relink(id(1), Some("one"), Some("one")), Relink::default());
    assert_eq!(reg.lead("one"), Some(id(1)));
}

#[test]
fn relink_into_and_out_of_no_key() {
    let mut reg = ContinuityStackRegistry::new();
    let relink = reg.relink(id(1), None, Some("one"));
    assert!(relink.left.is_none());
    assert_eq!(reg.lead("one"), Some(id(1)));

    reg.relink(id(1), Some("one"), None);
    assert!(reg.is_empty());
    assert!(reg.stacks_containing(id(1)).is_empty());
}

#[test]
fn relegate_skips_ineligible_members() {
    let mut reg = ContinuityStackRegistry::new();
    reg.add("card", id(1));
    reg.add("card", id(2));
    reg.add("card", id(3));

    let promo = reg.relegate("card", id(3), |n| n != id(2)).unwrap();
    assert_eq!(promo.new_lead, Some(id(1)));
    assert_eq!(reg.lead("card"), Some(id(1)));
    assert!(reg.stack("card").unwrap().contains(id(3)));

    // not the lead anymore
    assert!(reg.relegate("card", id(3), |_| true).is_none());
}

#[test]
fn keys_are_sorted() {
    let mut reg = ContinuityStackRegistry::new();
    reg.add("b", id(1));
    reg.add("a", id(2));
    assert_eq!(reg.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(reg.len(), 2);
}

#[test]
fn removing_the_previous_lead_forgets_it() {
    let mut reg = ContinuityStackRegistry::new();
    reg.add("card", id(1));
    reg.add("card", id(2));
    reg.add("card", id(3));
    assert_eq!(reg.stack("card").unwrap().prev_lead(), Some(id(2)));

    assert_eq!(reg.remove("card", id(2)), None);
    let stack = reg.stack("card").unwrap();
    assert_eq!(stack.prev_lead(), None);
    assert_eq!(stack.lead(), Some(id(3)));
}
