//! Capability dispatch over the closed record variant set.
//!
//! What a container accepts, how children are inset, and which records
//! resize is decided by matching on [`RecordType`], never by open-ended
//! subtype polymorphism. The eligibility table mirrors the builder's
//! rules: sections stack inside pages, items stack inside stacks, and
//! sections additionally own free-floating children without bindings.

use pagestack_store::{Props, Record, RecordType};

pub fn is_container(ty: RecordType) -> bool {
    matches!(
        ty,
        RecordType::Page | RecordType::Section | RecordType::Stack
    )
}

/// Whether a layout edge `container → child` is allowed.
pub fn binding_eligible(container: &Record, child: &Record) -> bool {
    matches!(
        (container.ty(), child.ty()),
        (RecordType::Page, RecordType::Section) | (RecordType::Stack, RecordType::Item)
    )
}

/// Containers that own children by plain reparenting, with no ordering
/// edge and no stacking.
pub fn accepts_free_children(ty: RecordType) -> bool {
    matches!(ty, RecordType::Section)
}

/// Sections resize along the stack axis only; stacks scale as a whole,
/// gap included. Stacked children never resize their own width, which
/// is always owned by the container.
pub fn resizable(ty: RecordType) -> bool {
    matches!(ty, RecordType::Section | RecordType::Stack)
}

/// Vertical spacing between stacked children.
pub fn gap(container: &Record) -> f64 {
    match &container.props {
        Props::Stack(p) => p.gap,
        _ => 0.0,
    }
}

pub fn top_inset(container: &Record) -> f64 {
    gap(container)
}

pub fn left_inset(container: &Record) -> f64 {
    gap(container)
}

/// Width forced onto stacked children so they always span the container.
pub fn content_width(container: &Record) -> f64 {
    match &container.props {
        Props::Page(p) => p.width,
        Props::Section(p) => p.w,
        Props::Stack(p) => p.width - p.gap * 2.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagestack_common::RecordId;
    use pagestack_store::{ItemProps, PageProps, SectionProps, StackProps};

    fn record(props: Props) -> Record {
        Record::new(props, RecordId::root())
    }

    #[test]
    fn eligibility_table() {
        let page = record(Props::Page(PageProps::default()));
        let section = record(Props::Section(SectionProps::default()));
        let stack = record(Props::Stack(StackProps::default()));
        let item = record(Props::Item(ItemProps::default()));

        assert!(binding_eligible(&page, &section));
        assert!(binding_eligible(&stack, &item));

        // pages only take sections; stacks reject containers
        assert!(!binding_eligible(&page, &item));
        assert!(!binding_eligible(&page, &page));
        assert!(!binding_eligible(&stack, &section));
        assert!(!binding_eligible(&stack, &stack));
        assert!(!binding_eligible(&section, &item));
        assert!(!binding_eligible(&item, &item));
    }

    #[test]
    fn stack_insets_use_gap() {
        let stack = record(Props::Stack(StackProps {
            width: 300.0,
            height: 400.0,
            gap: 8.0,
        }));
        assert_eq!(gap(&stack), 8.0);
        assert_eq!(top_inset(&stack), 8.0);
        assert_eq!(content_width(&stack), 284.0);

        let page = record(Props::Page(PageProps::default()));
        assert_eq!(gap(&page), 0.0);
        assert_eq!(content_width(&page), 1200.0);
    }
}
