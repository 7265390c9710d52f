//! Round-trip tests: record a document, replay it through the XML writer,
//! record the output again and compare the two scripts structurally.

#![allow(clippy::unwrap_used)]

use xmlscript::diff::{round_trip, structural_diff};
use xmlscript::writer::XmlWriter;
use xmlscript::{player, RecordOptions, Recorder};

fn assert_round_trips(doc: &str) {
    let divergence = round_trip(doc.as_bytes(), &RecordOptions::default()).unwrap();
    assert!(divergence.is_none(), "{doc}\n{}", divergence.unwrap());
}

#[test]
fn test_round_trip_elements_and_attributes() {
    assert_round_trips("<a/>");
    assert_round_trips("<a x=\"1\" y='two'><b/><c z=\"&lt;&amp;&gt;\"/></a>");
    assert_round_trips("<a v=\"tab&#9;nl&#10;cr&#13;\"/>");
    assert_round_trips("<a v='\"'/>");
}

#[test]
fn test_round_trip_text_forms() {
    assert_round_trips("<r>plain &amp; simple &lt;tag&gt; &#x263A; &#169;</r>");
    assert_round_trips("<r><![CDATA[ <not> & markup ]]><![CDATA[]]></r>");
    assert_round_trips("<r>line\r\nbreaks\rand&#13;returns</r>");
    assert_round_trips("<r>\n  <s>mixed</s>\n  tail\n</r>");
}

#[test]
fn test_round_trip_prolog_and_epilog() {
    assert_round_trips(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!-- head -->\n<?style sheet?>\n<r/>\n<!-- tail -->\n",
    );
    assert_round_trips("<?xml version=\"1.0\" standalone=\"yes\"?><r/>");
}

#[test]
fn test_round_trip_namespaces() {
    assert_round_trips("<p:a xmlns:p=\"urn:p\"><p:b/></p:a>");
    assert_round_trips("<a xmlns=\"urn:default\" xmlns:x=\"urn:x\" x:y=\"1\" x:z=\"2\"/>");
    assert_round_trips("<a xmlns:unused=\"urn:u\" plain=\"v\"/>");
}

#[test]
fn test_round_trip_doctype() {
    assert_round_trips("<!DOCTYPE r SYSTEM \"r.dtd\"><r/>");
    assert_round_trips("<!DOCTYPE r PUBLIC \"-//X//DTD R//EN\" \"r.dtd\"><r/>");
    assert_round_trips(
        "<!DOCTYPE book [\n\
         <!ELEMENT book (title,(chapter|appendix)+,index?)>\n\
         <!ELEMENT title (#PCDATA)>\n\
         <!ELEMENT chapter ANY>\n\
         <!ELEMENT appendix EMPTY>\n\
         <!ATTLIST chapter id ID #REQUIRED kind (intro|body) \"body\" n NMTOKEN #IMPLIED>\n\
         <!ATTLIST appendix ref IDREF #FIXED \"c1\">\n\
         <!ENTITY pub \"Example &#38; Sons\">\n\
         <!ENTITY % local \"ignored\">\n\
         <!ENTITY logo SYSTEM \"logo.png\" NDATA png>\n\
         <!NOTATION png PUBLIC \"-//PNG//EN\">\n\
         <!-- subset comment -->\n\
         <?subset pi?>\n\
         ]>\n\
         <book><title>&pub;</title><chapter id=\"c1\"/><appendix/></book>",
    );
}

#[test]
fn test_round_trip_notation_attribute_types() {
    assert_round_trips(
        "<!DOCTYPE r [<!NOTATION x SYSTEM \"x\"><!NOTATION y SYSTEM \"y\">\
         <!ATTLIST r n NOTATION (x) #IMPLIED m NOTATION ( x | y ) \"y\">]><r/>",
    );
}

#[test]
fn test_round_trip_entity_values() {
    // Both quote characters in one value.
    assert_round_trips("<!DOCTYPE r [<!ENTITY q \"&#34;'\">]><r/>");
    assert_round_trips("<!DOCTYPE r [<!ENTITY q '&#39;\"&#37;'>]><r/>");
    // Replacement text that holds a character reference, used in an attribute.
    assert_round_trips("<!DOCTYPE r [<!ENTITY a \"&#38;#38;\">]><r x=\"&a;\"/>");
    assert_round_trips(
        "<!DOCTYPE r [<!ENTITY e \"v\"><!ENTITY mix \"&#38; &e; &#60;&#38;x\">]><r/>",
    );
    assert_round_trips("<!DOCTYPE r [<!ENTITY nbsp \"&#160;\"><!ENTITY amp2 \"&amp;\">]><r/>");
}

#[test]
fn test_round_trip_each_declaration_kind() {
    for subset in [
        "<!ELEMENT r EMPTY>",
        "<!ELEMENT r ANY>",
        "<!ELEMENT r (#PCDATA)>",
        "<!ELEMENT r (#PCDATA|a|b)*>",
        "<!ELEMENT r (a,(b|c)+,d?)*>",
        "<!ATTLIST r a CDATA #IMPLIED b ID #REQUIRED c IDREFS #IMPLIED>",
        "<!ATTLIST r a (one|two) \"one\" b NMTOKENS #FIXED \"x y\">",
        "<!ATTLIST r a ENTITY #IMPLIED><!ATTLIST r b ENTITIES #IMPLIED>",
        "<!ATTLIST r v CDATA \"&lt;&amp;&quot;'\">",
        "<!ENTITY e \"text\"><!ENTITY % p \"pe\">",
        "<!ENTITY s SYSTEM \"s.xml\"><!ENTITY p PUBLIC \"-//P//EN\" \"p.xml\">",
        "<!NOTATION n SYSTEM \"n\"><!ENTITY u SYSTEM \"u.bin\" NDATA n>",
        "<!NOTATION a PUBLIC \"-//A//EN\"><!NOTATION b PUBLIC \"-//B//EN\" \"b\">",
    ] {
        assert_round_trips(&format!("<!DOCTYPE r [{subset}]><r/>"));
    }
}

#[test]
fn test_round_trip_declared_encoding() {
    let mut doc = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><r a=\"\xe9\">caf\xe9</r>".to_vec();
    assert_eq!(round_trip(&doc, &RecordOptions::default()).unwrap(), None);

    let script = Recorder::record_bytes(&doc, &RecordOptions::default()).unwrap();
    let mut writer = XmlWriter::new(Vec::new());
    player::run(&script, &mut writer).unwrap();
    doc.push(b'\n');
    assert_eq!(writer.into_inner(), doc);
}

#[test]
fn test_debug_provenance_does_not_affect_comparison() {
    let doc = "<a>\n<b c=\"d\"/>\n</a>";
    let plain = Recorder::record_str(doc, &RecordOptions::default()).unwrap();
    let debug = Recorder::record_str(doc, &RecordOptions::default().debug(true)).unwrap();
    assert_ne!(plain, debug);
    assert_eq!(structural_diff(&plain, &debug), None);
}

#[test]
fn test_structural_difference_detected() {
    let left = Recorder::record_str("<a><b>x</b></a>", &RecordOptions::default()).unwrap();
    let right = Recorder::record_str("<a><b>y</b></a>", &RecordOptions::default()).unwrap();
    let divergence = structural_diff(&left, &right).unwrap();
    assert_eq!(divergence.index, 2);
}
