use pretty_assertions::assert_eq;

use qdl::{Code, Severity};
use qdl_render::{render_outline, render_xml};

const TEMPLE: &str = "\
# The Lost Temple
summary: Find the idol.
author: Jane Doe
minplayers: 2
maxplayers: 4

_Temple Gate_

Vines cover the **ancient** doors.

* Push the doors

  _combat_ Stone Guardian

  * on win

    You enter the temple.

    **end**

  * on lose

    **end**

* Walk away

  **end**
";

#[test]
fn temple_quest_to_xml() {
    let mut compiler = render_xml(TEMPLE);
    let xml = compiler.result().map(ToString::to_string).unwrap_or_default();
    assert_eq!(
        xml,
        r#"<quest title="The Lost Temple" summary="Find the idol." author="Jane Doe" minplayers="2" maxplayers="4">
  <roleplay title="Temple Gate">
    <p>Vines cover the <b>ancient</b> doors.</p>
    <choice text="Push the doors">
      <combat>
        <e>Stone Guardian</e>
        <event on="win">
          <roleplay>
            <p>You enter the temple.</p>
          </roleplay>
          <trigger>end</trigger>
        </event>
        <event on="lose">
          <trigger>end</trigger>
        </event>
      </combat>
    </choice>
    <choice text="Walk away">
      <trigger>end</trigger>
    </choice>
  </roleplay>
</quest>
"#
    );
    let diagnostics = compiler.take_diagnostics().expect("rendered");
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
}

#[test]
fn temple_quest_to_outline() {
    let compiler = render_outline(TEMPLE);
    let outline = compiler.result().map(ToString::to_string).unwrap_or_default();
    assert_eq!(
        outline,
        "\
quest: The Lost Temple
  roleplay: Temple Gate
    choice: Push the doors
      combat: Stone Guardian
        event: win
          roleplay
          trigger: end
        event: lose
          trigger: end
    choice: Walk away
      trigger: end
"
    );
}

#[test]
fn result_at_maps_lines_to_cards() {
    let compiler = render_xml(TEMPLE);
    let name_at = |line: usize| compiler.result_at(line).map(|element| element.name);

    assert_eq!(name_at(3), Some("quest"));
    assert_eq!(name_at(5), None);
    assert_eq!(name_at(8), Some("roleplay"));
    assert_eq!(name_at(14), Some("combat"));
    assert_eq!(name_at(16), Some("roleplay"));
    assert_eq!(name_at(26), Some("trigger"));
    assert_eq!(name_at(100), None);
}

#[test]
fn meta_lists_quest_attributes() {
    let compiler = render_xml(TEMPLE);
    let meta = compiler.meta();
    assert_eq!(meta.get("title").map(String::as_str), Some("The Lost Temple"));
    assert_eq!(meta.get("author").map(String::as_str), Some("Jane Doe"));
    assert_eq!(meta.get("maxplayers").map(String::as_str), Some("4"));
    assert_eq!(meta.get("email"), None);
}

#[test]
fn bad_attributes_are_reported_in_order() {
    let mut compiler = render_xml("# Q\nplayers: 4\nminplayers: two\nno colon here\n");
    assert_eq!(
        compiler.result().map(ToString::to_string).unwrap_or_default(),
        "<quest title=\"Q\" minplayers=\"0\"/>\n"
    );

    let diagnostics = compiler.take_diagnostics().expect("rendered");
    let codes: Vec<Code> = diagnostics.error.iter().map(|d| d.code).collect();
    assert_eq!(
        codes,
        vec![Code::MALFORMED_LINE, Code::NOT_A_NUMBER, Code::UNKNOWN_ATTRIBUTE]
    );
    assert!(diagnostics.error.iter().all(|d| d.blocks == vec![0]));
    assert!(diagnostics.has_errors());
}

#[test]
fn attribute_text_is_escaped() {
    let compiler = render_xml("# Q\n\n* Say \"hi\" & wave\n\n  **end**\n");
    let xml = compiler.result().map(ToString::to_string).unwrap_or_default();
    assert!(
        xml.contains("<choice text=\"Say &quot;hi&quot; &amp; wave\">"),
        "{}",
        xml
    );
}

#[test]
fn broken_quest_still_renders() {
    let mut compiler = render_xml("Before the header.\n\n# Late\n\n_combat_\n");
    let xml = compiler.result().map(ToString::to_string).unwrap_or_default();
    assert_eq!(
        xml,
        "<quest title=\"\">\n\
         \x20 <roleplay>\n\
         \x20   <p>Before the header.</p>\n\
         \x20 </roleplay>\n\
         \x20 <quest title=\"Late\"/>\n\
         \x20 <combat/>\n\
         </quest>\n"
    );

    let diagnostics = compiler.take_diagnostics().expect("rendered");
    let errors: Vec<Code> = diagnostics.error.iter().map(|d| d.code).collect();
    assert_eq!(errors, vec![Code::NO_ENEMIES, Code::MISSING_QUEST]);
    assert!(diagnostics.bucket(Severity::Internal).is_empty());
}

#[test]
fn rendering_new_source_replaces_the_result() {
    let mut compiler = render_outline("# First\n");
    assert_eq!(
        compiler.result().map(ToString::to_string),
        Some("quest: First\n".to_string())
    );

    compiler.render_source("# Second\n\n**end**\n");
    assert_eq!(
        compiler.result().map(ToString::to_string),
        Some("quest: Second\n  trigger: end\n".to_string())
    );
    assert_eq!(compiler.take_diagnostics().map(|d| d.len()), Some(0));
}
