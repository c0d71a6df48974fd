//! Construction des enveloppes SOAP

use quick_xml::{
    Reader, Writer,
    events::{BytesEnd, BytesStart, BytesText, Event},
};
use serde::Serialize;

use crate::{Body, EncodeError, Envelope, SOAP_ENV_NS, SOAP_ENV_PREFIX, XML_DECLARATION};

const INDENT_SIZE: usize = 2;

/// Sérialise une enveloppe SOAP en document XML
///
/// Le contenu de l'en-tête et du corps est sérialisé avec `quick_xml::se` :
/// le nom de l'élément racine est le nom serde du type
/// (`#[serde(rename = "...")]`). Aucune validation n'est faite sur la forme
/// du contenu.
pub fn encode<H, B>(envelope: &Envelope<H, B>) -> Result<Vec<u8>, EncodeError>
where
    H: Serialize,
    B: Serialize,
{
    let header = envelope
        .header
        .as_ref()
        .map(|header| to_fragment(&header.content))
        .transpose()?;

    let body = match &envelope.body {
        Body::Content(content) => to_fragment(content)?,
        Body::Fault(fault) => {
            quick_xml::se::to_string_with_root(&format!("{SOAP_ENV_PREFIX}:Fault"), fault)?
        }
    };

    write_envelope(header.as_deref(), &body, Layout::Keep)
}

/// Enveloppe des fragments XML déjà sérialisés
///
/// Les nœuds texte composés uniquement d'espaces sont considérés comme de la
/// mise en forme et remplacés par l'indentation de l'enveloppe.
pub fn encode_fragments(header: Option<&str>, body: &str) -> Result<Vec<u8>, EncodeError> {
    write_envelope(header, body, Layout::Reindent)
}

/// Sérialise une valeur en fragment XML, sans déclaration
pub fn to_fragment<T: Serialize + ?Sized>(value: &T) -> Result<String, EncodeError> {
    Ok(quick_xml::se::to_string(value)?)
}

#[derive(Clone, Copy)]
enum Layout {
    Keep,
    Reindent,
}

fn write_envelope(
    header: Option<&str>,
    body: &str,
    layout: Layout,
) -> Result<Vec<u8>, EncodeError> {
    let envelope_tag = format!("{SOAP_ENV_PREFIX}:Envelope");
    let header_tag = format!("{SOAP_ENV_PREFIX}:Header");
    let body_tag = format!("{SOAP_ENV_PREFIX}:Body");
    let xmlns = format!("xmlns:{SOAP_ENV_PREFIX}");

    let buf = XML_DECLARATION.as_bytes().to_vec();
    let mut writer = Writer::new_with_indent(buf, b' ', INDENT_SIZE);

    writer.write_event(Event::Start(
        BytesStart::new(envelope_tag.as_str()).with_attributes([(xmlns.as_str(), SOAP_ENV_NS)]),
    ))?;

    if let Some(header) = header {
        writer.write_event(Event::Start(BytesStart::new(header_tag.as_str())))?;
        write_fragment(&mut writer, header, layout)?;
        writer.write_event(Event::End(BytesEnd::new(header_tag.as_str())))?;
    }

    writer.write_event(Event::Start(BytesStart::new(body_tag.as_str())))?;
    write_fragment(&mut writer, body, layout)?;
    writer.write_event(Event::End(BytesEnd::new(body_tag.as_str())))?;

    writer.write_event(Event::End(BytesEnd::new(envelope_tag.as_str())))?;

    Ok(writer.into_inner())
}

/// Recopie un fragment dans le writer pour qu'il suive l'indentation
fn write_fragment(
    writer: &mut Writer<Vec<u8>>,
    fragment: &str,
    layout: Layout,
) -> Result<(), EncodeError> {
    let mut reader = Reader::from_str(fragment);

    loop {
        match reader.read_event()? {
            Event::Eof => break,
            Event::Decl(_) | Event::DocType(_) => {}
            Event::Text(text)
                if matches!(layout, Layout::Reindent)
                    && text.iter().all(u8::is_ascii_whitespace) => {}
            // Written as text so the indenter never breaks the line around it
            Event::GeneralRef(reference) => {
                let escaped = format!("&{};", String::from_utf8_lossy(&reference));
                writer.write_event(Event::Text(BytesText::from_escaped(escaped)))?;
            }
            event => writer.write_event(event)?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Fault, Header};

    #[derive(Serialize)]
    #[serde(rename = "myRequestHeader")]
    struct RequestHeader {
        #[serde(rename = "userId")]
        user_id: String,
        password: String,
    }

    #[derive(Serialize)]
    #[serde(rename = "testRequest")]
    struct TestRequest {
        message: String,
    }

    fn request() -> TestRequest {
        TestRequest {
            message: "test".to_string(),
        }
    }

    #[test]
    fn test_encode_without_header() {
        let envelope: Envelope<(), TestRequest> = Envelope::new(Body::Content(request()));
        let xml = String::from_utf8(encode(&envelope).unwrap()).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<soap:Envelope"));
        assert!(xml.contains("xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\""));
        assert!(!xml.contains("soap:Header"));
        assert!(xml.contains("<message>test</message>"));
        assert!(xml.trim_end().ends_with("</soap:Envelope>"));
    }

    #[test]
    fn test_encode_with_header_is_indented() {
        let header = RequestHeader {
            user_id: "myname".to_string(),
            password: "pass".to_string(),
        };
        let envelope = Envelope::with_header(Header::new(header), Body::Content(request()));
        let xml = String::from_utf8(encode(&envelope).unwrap()).unwrap();

        assert!(xml.contains("\n  <soap:Header>\n    <myRequestHeader>\n"));
        assert!(xml.contains("\n      <userId>myname</userId>\n"));
        assert!(xml.contains("\n  <soap:Body>\n    <testRequest>\n"));
        assert!(xml.find("soap:Header").unwrap() < xml.find("soap:Body").unwrap());
    }

    #[test]
    fn test_encode_escapes_content() {
        let envelope: Envelope<(), TestRequest> = Envelope::new(Body::Content(TestRequest {
            message: "a < b & c".to_string(),
        }));
        let xml = String::from_utf8(encode(&envelope).unwrap()).unwrap();

        assert!(xml.contains("<message>a &lt; b &amp; c</message>"));
    }

    #[test]
    fn test_encode_fault() {
        let fault = Fault {
            fault_code: Some("Error".to_string()),
            ..Fault::default()
        }
        .with_actor("Actor")
        .with_detail("Something went wrong");
        let envelope: Envelope<(), ()> = Envelope::new(Body::Fault(fault));
        let xml = String::from_utf8(encode(&envelope).unwrap()).unwrap();

        assert!(xml.contains("<soap:Fault>"));
        assert!(xml.contains("<faultcode>Error</faultcode>"));
        assert!(xml.contains("<faultactor>Actor</faultactor>"));
        assert!(xml.contains("<detail>Something went wrong</detail>"));
        assert!(!xml.contains("faultstring"));
    }

    #[test]
    fn test_encode_unnamed_content_fails() {
        let envelope: Envelope<(), &str> = Envelope::new(Body::Content("bare text"));
        assert!(matches!(encode(&envelope), Err(EncodeError::Serialize(_))));
    }

    #[test]
    fn test_encode_fragments_reindents() {
        let body = "<u:Play xmlns:u=\"urn:test\">\n<Speed>1</Speed>\n</u:Play>";
        let xml = String::from_utf8(encode_fragments(None, body).unwrap()).unwrap();

        assert!(xml.contains("\n    <u:Play xmlns:u=\"urn:test\">\n      <Speed>1</Speed>\n"));
    }

    #[test]
    fn test_encode_fragments_rejects_malformed() {
        let result = encode_fragments(None, "<a><b></a>");
        assert!(matches!(result, Err(EncodeError::Fragment(_))));
    }
}
