use axum::response::Html;

const UPLOAD_FORM: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>picstore</title>
</head>
<body>
  <h1>Upload a photo</h1>
  <form action="/photos" method="post" enctype="multipart/form-data">
    <input type="file" name="photo" accept="image/jpeg,image/png,image/gif">
    <button type="submit">Upload</button>
  </form>
</body>
</html>
"#;

/// Browser upload form posting to `/photos`
pub async fn index() -> Html<&'static str> {
    Html(UPLOAD_FORM)
}
